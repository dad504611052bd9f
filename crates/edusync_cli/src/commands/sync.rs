//! Replication commands: sync, watch, status, channel.

use super::AppContext;
use clap::Subcommand;
use edusync_channel::ChannelId;
use edusync_engine::SyncScheduler;
use std::error::Error;
use std::sync::Arc;

/// Channel management subcommands.
#[derive(Subcommand)]
pub enum ChannelCommand {
    /// Print the adopted channel id
    Show,

    /// Join an existing channel by id
    Set {
        /// Channel id shared between devices
        id: String,
    },

    /// Provision a fresh channel from local state
    ///
    /// Also the recovery action after the store rate limits the old channel.
    New,
}

/// One-shot sync: bootstrap if needed, pull, then publish divergence.
pub fn run(ctx: &AppContext, force: bool) -> Result<(), Box<dyn Error>> {
    if ctx.engine.channel_id().is_none() {
        ctx.engine.bootstrap()?;
        println!(
            "Provisioned channel {}",
            ctx.engine
                .channel_id()
                .map(|id| id.to_string())
                .unwrap_or_default()
        );
        return Ok(());
    }

    let changed = ctx.engine.pull_now(force)?;
    let pushed = ctx.engine.push_now()?;

    match (changed, pushed) {
        (false, false) => println!("Already in sync"),
        (true, false) => println!("Merged remote changes"),
        (false, true) => println!("Published local changes"),
        (true, true) => println!("Merged remote changes and published local ones"),
    }
    Ok(())
}

/// Polls the channel at the configured interval until Enter is pressed.
pub fn watch(ctx: AppContext) -> Result<(), Box<dyn Error>> {
    let scheduler = SyncScheduler::start(Arc::clone(&ctx.engine));
    println!("Watching for changes; press Enter to stop.");

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    scheduler.stop();
    status(&ctx)
}

/// Prints the engine's status flags.
pub fn status(ctx: &AppContext) -> Result<(), Box<dyn Error>> {
    let status = ctx.engine.status();
    let snapshot = ctx.engine.snapshot();

    match ctx.engine.channel_id() {
        Some(id) => println!("channel:      {id}"),
        None => println!("channel:      (none)"),
    }
    println!("online:       {}", status.is_online);
    println!("rate limited: {}", status.is_rate_limited);
    match status.last_sync_time {
        Some(ms) => println!("last sync:    {ms} ms since epoch"),
        None => println!("last sync:    never"),
    }
    println!(
        "state:        {} users, {} courses, {} tasks, {} submissions (lastUpdated {})",
        snapshot.users.len(),
        snapshot.courses.len(),
        snapshot.tasks.len(),
        snapshot.submissions.len(),
        snapshot.last_updated
    );
    Ok(())
}

/// Dispatches a channel subcommand.
pub fn channel(ctx: &AppContext, command: ChannelCommand) -> Result<(), Box<dyn Error>> {
    match command {
        ChannelCommand::Show => {
            match ctx.engine.channel_id() {
                Some(id) => println!("{id}"),
                None => println!("(none)"),
            }
            Ok(())
        }
        ChannelCommand::Set { id } => {
            ctx.engine.set_channel_id(ChannelId::new(id.clone()))?;
            ctx.engine.pull_now(true)?;
            println!("Joined channel {id}");
            Ok(())
        }
        ChannelCommand::New => {
            let id = ctx.engine.create_channel()?;
            println!("Provisioned channel {id}");
            Ok(())
        }
    }
}
