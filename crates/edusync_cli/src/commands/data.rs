//! Data commands: leaderboard, export, import.

use super::AppContext;
use edusync_engine::ActionPipeline;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Prints users ranked by total score.
pub fn leaderboard(ctx: &AppContext) -> Result<(), Box<dyn Error>> {
    let snapshot = ctx.engine.snapshot();
    let mut users: Vec<_> = snapshot.users.values().collect();
    users.sort_by(|a, b| b.total_score.cmp(&a.total_score).then(a.username.cmp(&b.username)));

    for (rank, user) in users.iter().enumerate() {
        println!("{:>3}. {:<20} {:>6} pts", rank + 1, user.username, user.total_score);
    }
    Ok(())
}

/// Writes the current state as pretty JSON.
pub fn export(ctx: &AppContext, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let backup = ActionPipeline::new(&ctx.engine).export_state()?;
    match output {
        Some(path) => {
            fs::write(path, backup)?;
            println!("Exported to {}", path.display());
        }
        None => println!("{backup}"),
    }
    Ok(())
}

/// Replaces the state from a JSON backup file.
///
/// A file that does not parse as a snapshot is rejected and nothing changes.
pub fn import(ctx: &AppContext, input: &Path) -> Result<(), Box<dyn Error>> {
    let json = fs::read_to_string(input)?;
    ActionPipeline::new(&ctx.engine).import_state(&json)?;
    println!("Imported {}", input.display());
    Ok(())
}
