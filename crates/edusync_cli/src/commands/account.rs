//! Account commands: register, login, logout, whoami, passwd.

use super::AppContext;
use edusync_engine::ActionPipeline;
use std::error::Error;

/// Creates an account and logs it in.
pub fn register(ctx: &AppContext, username: &str, password: &str) -> Result<(), Box<dyn Error>> {
    let pipeline = ActionPipeline::new(&ctx.engine);
    let name = pipeline.register(username, password)?;
    ctx.set_session(&name)?;
    println!("Registered and logged in as {name}");

    if ctx.engine.channel_id().is_none() {
        println!("No sync channel yet; run `edusync sync` to publish.");
    }
    Ok(())
}

/// Verifies credentials against local state and remembers the session.
pub fn login(ctx: &AppContext, username: &str, password: &str) -> Result<(), Box<dyn Error>> {
    // Refresh first so a recently registered account on another device can
    // log in here; failures just mean we check against local state.
    if ctx.engine.channel_id().is_some() {
        let _ = ctx.engine.pull_now(true);
    }

    let pipeline = ActionPipeline::new(&ctx.engine);
    let user = pipeline.login(username, password)?;
    ctx.set_session(&user.username)?;
    println!("Logged in as {} ({:?})", user.username, user.role);
    Ok(())
}

/// Forgets the active session.
pub fn logout(ctx: &AppContext) -> Result<(), Box<dyn Error>> {
    ctx.clear_session()?;
    println!("Logged out");
    Ok(())
}

/// Prints the active session.
pub fn whoami(ctx: &AppContext) -> Result<(), Box<dyn Error>> {
    match ctx.session_user()? {
        Some(name) => println!("{name}"),
        None => println!("not logged in"),
    }
    Ok(())
}

/// Changes the active user's password.
pub fn passwd(ctx: &AppContext, password: &str) -> Result<(), Box<dyn Error>> {
    let name = ctx.require_session()?;
    let pipeline = ActionPipeline::new(&ctx.engine);
    pipeline.change_password(&name, password)?;
    println!("Password updated for {name}");
    Ok(())
}
