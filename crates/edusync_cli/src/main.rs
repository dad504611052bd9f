//! EduSync CLI
//!
//! Command-line client for the EduSync replication engine.
//!
//! # Commands
//!
//! - `register` / `login` / `logout` / `whoami` / `passwd` - account management
//! - `courses` / `tasks` / `submit` / `grade` / `leaderboard` - course work
//! - `sync` / `watch` / `status` / `channel` - replication control
//! - `export` / `import` - data portability

mod commands;

use clap::{Parser, Subcommand};
use commands::AppContext;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// EduSync multi-device education platform client.
#[derive(Parser)]
#[command(name = "edusync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory for local state
    #[arg(global = true, long, default_value = ".edusync")]
    data_dir: PathBuf,

    /// Remote object-store endpoint
    #[arg(global = true, long, default_value = "https://api.restful-api.dev/objects")]
    server: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        /// Username (normalized to lowercase)
        username: String,
        /// Password
        password: String,
    },

    /// Log in and remember the session
    Login {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Forget the active session
    Logout,

    /// Show the active session
    Whoami,

    /// Change the active user's password
    Passwd {
        /// New password
        password: String,
    },

    /// Manage courses
    #[command(subcommand)]
    Courses(commands::courses::CourseCommand),

    /// Manage tasks
    #[command(subcommand)]
    Tasks(commands::tasks::TaskCommand),

    /// Submit a text answer for a task
    Submit {
        /// Task id
        task_id: String,
        /// Answer text
        answer: String,
    },

    /// Grade a submission (admin)
    Grade {
        /// Submission id
        submission_id: String,
        /// Points awarded
        grade: i64,
        /// Reviewer comment
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Show users ranked by total score
    Leaderboard,

    /// Pull remote changes and publish local ones
    Sync {
        /// Bypass the remote-not-newer short-circuit
        #[arg(short, long)]
        force: bool,
    },

    /// Poll the channel continuously until Enter is pressed
    Watch,

    /// Show sync status
    Status,

    /// Manage the sync channel
    #[command(subcommand)]
    Channel(commands::sync::ChannelCommand),

    /// Write the current state as a JSON backup
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the state from a JSON backup
    Import {
        /// Backup file to read
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ctx = AppContext::open(&cli.data_dir, &cli.server)?;

    match cli.command {
        Commands::Register { username, password } => {
            commands::account::register(&ctx, &username, &password)?;
        }
        Commands::Login { username, password } => {
            commands::account::login(&ctx, &username, &password)?;
        }
        Commands::Logout => commands::account::logout(&ctx)?,
        Commands::Whoami => commands::account::whoami(&ctx)?,
        Commands::Passwd { password } => commands::account::passwd(&ctx, &password)?,
        Commands::Courses(command) => commands::courses::run(&ctx, command)?,
        Commands::Tasks(command) => commands::tasks::run(&ctx, command)?,
        Commands::Submit { task_id, answer } => {
            commands::tasks::submit(&ctx, &task_id, &answer)?;
        }
        Commands::Grade {
            submission_id,
            grade,
            comment,
        } => commands::tasks::grade(&ctx, &submission_id, grade, comment)?,
        Commands::Leaderboard => commands::data::leaderboard(&ctx)?,
        Commands::Sync { force } => commands::sync::run(&ctx, force)?,
        Commands::Watch => commands::sync::watch(ctx)?,
        Commands::Status => commands::sync::status(&ctx)?,
        Commands::Channel(command) => commands::sync::channel(&ctx, command)?,
        Commands::Export { output } => commands::data::export(&ctx, output.as_deref())?,
        Commands::Import { input } => commands::data::import(&ctx, &input)?,
    }

    Ok(())
}
