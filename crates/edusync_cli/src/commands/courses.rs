//! Course commands: list, add, enroll.

use super::AppContext;
use chrono::{SecondsFormat, Utc};
use clap::Subcommand;
use edusync_core::{Course, CourseLevel};
use edusync_engine::ActionPipeline;
use std::error::Error;

/// Course management subcommands.
#[derive(Subcommand)]
pub enum CourseCommand {
    /// List all courses
    List,

    /// Add a course (admin)
    Add {
        /// Course title
        title: String,
        /// Course description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Instructor display name
        #[arg(short, long, default_value = "")]
        instructor: String,
        /// Human-readable duration
        #[arg(long, default_value = "")]
        duration: String,
        /// Difficulty: beginner, intermediate or advanced
        #[arg(short, long, default_value = "beginner")]
        level: String,
    },

    /// Enroll the active user into a course
    Enroll {
        /// Course id
        course_id: String,
    },
}

/// Dispatches a course subcommand.
pub fn run(ctx: &AppContext, command: CourseCommand) -> Result<(), Box<dyn Error>> {
    match command {
        CourseCommand::List => list(ctx),
        CourseCommand::Add {
            title,
            description,
            instructor,
            duration,
            level,
        } => add(ctx, title, description, instructor, duration, &level),
        CourseCommand::Enroll { course_id } => enroll(ctx, &course_id),
    }
}

fn list(ctx: &AppContext) -> Result<(), Box<dyn Error>> {
    let snapshot = ctx.engine.snapshot();
    if snapshot.courses.is_empty() {
        println!("No courses");
        return Ok(());
    }
    for course in snapshot.courses.values() {
        println!(
            "{}  {} ({:?}, {} students)",
            course.id,
            course.title,
            course.level,
            course.student_usernames.len()
        );
    }
    Ok(())
}

fn add(
    ctx: &AppContext,
    title: String,
    description: String,
    instructor: String,
    duration: String,
    level: &str,
) -> Result<(), Box<dyn Error>> {
    let course = Course {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        description,
        instructor,
        duration,
        level: parse_level(level)?,
        student_usernames: Vec::new(),
        task_ids: Vec::new(),
        created_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let id = course.id.clone();

    ActionPipeline::new(&ctx.engine).add_course(course)?;
    println!("Added course {id}");
    Ok(())
}

fn enroll(ctx: &AppContext, course_id: &str) -> Result<(), Box<dyn Error>> {
    let name = ctx.require_session()?;
    ActionPipeline::new(&ctx.engine).enroll(&name, course_id)?;
    println!("Enrolled {name} in {course_id}");
    Ok(())
}

fn parse_level(raw: &str) -> Result<CourseLevel, Box<dyn Error>> {
    match raw.to_lowercase().as_str() {
        "beginner" => Ok(CourseLevel::Beginner),
        "intermediate" => Ok(CourseLevel::Intermediate),
        "advanced" => Ok(CourseLevel::Advanced),
        other => Err(format!("unknown level {other:?} (expected beginner, intermediate or advanced)").into()),
    }
}
