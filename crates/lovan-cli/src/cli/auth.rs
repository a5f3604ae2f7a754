//! Account commands: login, register, logout, whoami.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password};

use lovan_types::identity::Identity;

use crate::state::{AppState, ConcreteController};

use super::spinner;

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(e) => Ok(e),
        None => Ok(Input::<String>::new().with_prompt("Email").interact_text()?),
    }
}

/// Prompt for credentials and log in through the controller.
///
/// Shared with the chat loop's `/login`.
pub async fn login_interactive(controller: &mut ConcreteController, email: Option<String>) -> Result<()> {
    let email = prompt_email(email)?;
    let password = Password::new().with_prompt("Password").interact()?;

    let spinner = spinner("Logging in...");
    let result = controller.login(&email, &password).await;
    spinner.finish_and_clear();
    result.context("login failed")?;
    Ok(())
}

pub async fn login(state: &mut AppState, email: Option<String>, json: bool) -> Result<()> {
    login_interactive(&mut state.controller, email).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&whoami_json(state.controller.identity()))?);
        return Ok(());
    }
    println!();
    println!(
        "  {} Logged in as {}",
        style("✓").green().bold(),
        style(state.controller.identity().email().unwrap_or_default()).cyan()
    );
    println!();
    Ok(())
}

pub async fn register(state: &AppState, email: Option<String>, json: bool) -> Result<()> {
    let email = prompt_email(email)?;
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let spinner = spinner("Creating account...");
    let result = state.controller.register(&email, &password).await;
    spinner.finish_and_clear();
    result.context("registration failed")?;

    if json {
        println!("{}", serde_json::json!({ "registered": email }));
        return Ok(());
    }
    println!();
    println!("  {} Account created for {}", style("✓").green().bold(), style(&email).cyan());
    println!(
        "  Check your inbox to confirm it, then run {}",
        style("lovan login").yellow()
    );
    println!();
    Ok(())
}

pub async fn logout(state: &mut AppState, json: bool) -> Result<()> {
    let was = state.controller.identity().email().map(str::to_string);
    state.controller.logout().await;

    if json {
        println!("{}", serde_json::json!({ "logged_out": was }));
        return Ok(());
    }
    match was {
        Some(email) => println!("  {} Logged out {}", style("✓").green().bold(), email),
        None => println!("  Not logged in."),
    }
    Ok(())
}

fn whoami_json(identity: &Identity) -> serde_json::Value {
    match identity {
        Identity::Authenticated(auth) => serde_json::json!({
            "authenticated": true,
            "email": auth.email,
            "subject_id": auth.subject_id,
            "since": auth.created_at,
        }),
        Identity::Anonymous => serde_json::json!({ "authenticated": false }),
    }
}

pub fn whoami(state: &AppState, json: bool) -> Result<()> {
    let identity = state.controller.identity();
    if json {
        println!("{}", serde_json::to_string_pretty(&whoami_json(identity))?);
        return Ok(());
    }

    match identity {
        Identity::Authenticated(auth) => {
            println!("  {}", style(&auth.email).cyan());
            if let Some(since) = auth.created_at {
                println!(
                    "  {}",
                    style(format!("logged in {}", since.format("%Y-%m-%d %H:%M UTC"))).dim()
                );
            }
        }
        Identity::Anonymous => println!(
            "  Not logged in. Run {}",
            style("lovan login").yellow()
        ),
    }
    Ok(())
}
