//! `lovan analyze` and `lovan roles`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use lovan_core::gate::controller::SubmissionOutcome;
use lovan_types::analysis::RoleTag;

use crate::state::AppState;

use super::chat::loop_runner::run_chat_loop;
use super::render::print_analysis;
use super::spinner;

const PRIVACY_NOTICE: &str = "The message is sent to the analysis service. If you are logged in, \
the analysis is saved to your history; otherwise nothing is stored.";

/// Consent, submit, render, then optionally chat.
pub async fn analyze(
    state: &mut AppState,
    role: Option<String>,
    message: Option<String>,
    yes: bool,
    chat: bool,
    json: bool,
) -> Result<()> {
    let controller = &mut state.controller;
    controller.request_analysis()?;

    if !yes {
        println!();
        println!("  {} {}", style("i").blue().bold(), PRIVACY_NOTICE);
        let accepted = Confirm::new()
            .with_prompt("Continue?")
            .default(false)
            .interact()?;
        if !accepted {
            controller.cancel_consent()?;
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let role = match role {
        Some(r) => r,
        None => prompt_role()?.as_key().to_string(),
    };
    let message = match message {
        Some(m) => m,
        None => Input::<String>::new()
            .with_prompt("Message you received")
            .interact_text()?,
    };

    let spinner = spinner("Analyzing...");
    let outcome = controller.submit(&role, &message).await;
    spinner.finish_and_clear();
    if outcome.context("analysis failed")? == SubmissionOutcome::Discarded {
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&controller.view())?);
        return Ok(());
    }

    if let Some(active) = controller.active_analysis() {
        print_analysis(active);
    }

    if !controller.identity().is_authenticated() {
        println!(
            "  {} Log in to ask follow-up questions: {}",
            style("i").blue().bold(),
            style("lovan login").yellow()
        );
        println!();
    }

    if chat {
        run_chat_loop(state).await?;
    }
    Ok(())
}

fn prompt_role() -> Result<RoleTag> {
    let labels: Vec<&str> = RoleTag::ALL.iter().map(RoleTag::label).collect();
    let index = Select::new()
        .with_prompt("Who sent it?")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(RoleTag::ALL[index])
}

pub fn list_roles(json: bool) -> Result<()> {
    if json {
        let roles: Vec<_> = RoleTag::ALL
            .iter()
            .map(|r| serde_json::json!({ "key": r.as_key(), "label": r.label() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&roles)?);
        return Ok(());
    }

    println!();
    for role in RoleTag::ALL {
        println!("  {:<10} {}", style(role.as_key()).cyan(), role.label());
    }
    println!();
    Ok(())
}
