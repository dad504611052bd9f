//! Task commands: list, add, submit, grade.

use super::AppContext;
use chrono::{SecondsFormat, Utc};
use clap::Subcommand;
use edusync_core::{Submission, SubmissionStatus, Task, TaskKind};
use edusync_engine::ActionPipeline;
use std::error::Error;

/// Task management subcommands.
#[derive(Subcommand)]
pub enum TaskCommand {
    /// List all tasks
    List,

    /// Add a text task to a course (admin)
    Add {
        /// Owning course id
        course_id: String,
        /// Task title
        title: String,
        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Maximum points
        #[arg(short, long, default_value_t = 10)]
        max_points: i64,
        /// ISO-8601 deadline
        #[arg(long, default_value = "")]
        deadline: String,
    },
}

/// Dispatches a task subcommand.
pub fn run(ctx: &AppContext, command: TaskCommand) -> Result<(), Box<dyn Error>> {
    match command {
        TaskCommand::List => list(ctx),
        TaskCommand::Add {
            course_id,
            title,
            description,
            max_points,
            deadline,
        } => add(ctx, course_id, title, description, max_points, deadline),
    }
}

fn list(ctx: &AppContext) -> Result<(), Box<dyn Error>> {
    let snapshot = ctx.engine.snapshot();
    if snapshot.tasks.is_empty() {
        println!("No tasks");
        return Ok(());
    }
    for task in snapshot.tasks.values() {
        let course = snapshot
            .courses
            .get(&task.course_id)
            .map(|c| c.title.as_str())
            .unwrap_or("?");
        println!(
            "{}  {} [{course}] ({} pts, due {})",
            task.id, task.title, task.max_points, task.deadline
        );
    }
    Ok(())
}

fn add(
    ctx: &AppContext,
    course_id: String,
    title: String,
    description: String,
    max_points: i64,
    deadline: String,
) -> Result<(), Box<dyn Error>> {
    let task = Task {
        id: uuid::Uuid::new_v4().to_string(),
        course_id,
        title,
        description,
        kind: TaskKind::Text,
        text_content: None,
        video_url: None,
        video_filename: None,
        time_limit: None,
        max_points,
        deadline,
        created_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        lesson_status: None,
        lesson_start_time: None,
    };
    let id = task.id.clone();

    ActionPipeline::new(&ctx.engine).add_task(task)?;
    println!("Added task {id}");
    Ok(())
}

/// Records a text submission from the active user.
pub fn submit(ctx: &AppContext, task_id: &str, answer: &str) -> Result<(), Box<dyn Error>> {
    let name = ctx.require_session()?;
    let submission = Submission {
        id: uuid::Uuid::new_v4().to_string(),
        username: name,
        task_id: task_id.to_string(),
        kind: TaskKind::Text,
        answer_text: Some(answer.to_string()),
        video_url: None,
        status: SubmissionStatus::Pending,
        grade: None,
        admin_comment: None,
        submission_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let id = submission.id.clone();

    ActionPipeline::new(&ctx.engine).submit(submission)?;
    println!("Submitted {id}");
    Ok(())
}

/// Approves a submission with a grade.
pub fn grade(
    ctx: &AppContext,
    submission_id: &str,
    grade: i64,
    comment: Option<String>,
) -> Result<(), Box<dyn Error>> {
    ActionPipeline::new(&ctx.engine).grade(submission_id, grade, comment)?;
    println!("Graded {submission_id}: {grade} pts");
    Ok(())
}
