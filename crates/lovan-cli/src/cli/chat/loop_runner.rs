//! Chat loop: read lines from stdin, dispatch slash commands, send the rest
//! as follow-up turns through the controller.

use std::io::Write;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use lovan_core::gate::controller::ChatOutcome;
use lovan_types::error::SessionError;

use crate::cli::auth::login_interactive;
use crate::cli::render::{print_transcript, print_turn};
use crate::cli::spinner;
use crate::state::{AppState, ConcreteController};

use super::commands::{self, ChatCommand};

/// Run the follow-up chat for the active analysis until the user leaves.
pub async fn run_chat_loop(state: &mut AppState) -> anyhow::Result<()> {
    let controller = &mut state.controller;
    if controller.active_analysis().is_none() {
        anyhow::bail!("there is no analysis to talk about");
    }

    println!(
        "  {} Ask anything about this message. {} for commands.",
        style("💬").bold(),
        style("/help").cyan()
    );
    if !controller.identity().is_authenticated() {
        println!(
            "  {}",
            style("Chat requires an account. Use /login when you're ready.").dim()
        );
    }
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("›").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        if let Some(command) = commands::parse(&line) {
            match command {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Save => save(controller).await,
                ChatCommand::Login => login(controller).await,
                ChatCommand::Transcript => print_transcript(controller.thread().turns()),
                ChatCommand::New => {
                    controller.new_analysis();
                    println!(
                        "  Analysis closed. Start another with {}",
                        style("lovan analyze").yellow()
                    );
                    break;
                }
                ChatCommand::Exit => break,
                ChatCommand::Unknown(cmd) => println!(
                    "  {} Unknown command {cmd}. Try {}",
                    style("?").yellow().bold(),
                    style("/help").cyan()
                ),
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }
        send(controller, &line).await;
    }

    debug!(turns = controller.thread().len(), "Chat loop finished");
    Ok(())
}

async fn send(controller: &mut ConcreteController, text: &str) {
    let spinner = spinner("thinking...");
    let outcome = controller.send_chat(text).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(ChatOutcome::Replied { .. } | ChatOutcome::Failed { .. }) => {
            if let Some(turn) = controller.thread().turns().last() {
                print_turn(turn);
            }
            println!();
        }
        Ok(ChatOutcome::Discarded) => {}
        Err(SessionError::AuthRequired) => println!(
            "  {} Log in to continue the conversation ({}). Your message was kept.",
            style("🔒").bold(),
            style("/login").cyan()
        ),
        Err(err) => println!("  {} {err}", style("✗").red().bold()),
    }
}

async fn login(controller: &mut ConcreteController) {
    if let Err(err) = login_interactive(controller, None).await {
        println!("  {} {err:#}", style("✗").red().bold());
        return;
    }
    println!(
        "  {} Logged in as {}",
        style("✓").green().bold(),
        style(controller.identity().email().unwrap_or_default()).cyan()
    );

    if let Some(draft) = controller.take_deferred_draft() {
        println!("  {} {draft}", style("you ›").cyan().bold());
        send(controller, &draft).await;
    }
}

async fn save(controller: &mut ConcreteController) {
    match controller.persist_transcript().await {
        Ok(turns) => println!(
            "  {} Saved {turns} turns to your history",
            style("✓").green().bold()
        ),
        Err(SessionError::NotResumable) => println!(
            "  {} This analysis has no saved record to update. Open it with {} to save its conversation.",
            style("i").blue().bold(),
            style("lovan resume <id>").yellow()
        ),
        Err(err) => println!("  {} {err}", style("✗").red().bold()),
    }
}
