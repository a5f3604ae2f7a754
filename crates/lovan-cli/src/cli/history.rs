//! `lovan history` and `lovan resume`.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use lovan_types::history::HistoryRecord;

use crate::state::AppState;

use super::chat::loop_runner::run_chat_loop;
use super::render::{print_analysis, print_transcript, truncate};
use super::spinner;

/// Flag markers shown in the history table.
fn flag_markers(record: &HistoryRecord) -> String {
    let mut markers = String::new();
    if record.result.has_red_flags() {
        markers.push_str("🚩");
    }
    if record.result.has_green_flags() {
        markers.push_str("🟩");
    }
    markers
}

pub async fn list_history(state: &AppState, limit: usize, json: bool) -> Result<()> {
    let spinner = spinner("Loading history...");
    let records = state.controller.fetch_history().await;
    spinner.finish_and_clear();
    let records = records.context("could not load history")?;

    if json {
        let shown: Vec<_> = records.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!(
            "  {} No saved analyses yet. Run {} while logged in.",
            style("i").blue().bold(),
            style("lovan analyze").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Date").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Flags").fg(Color::White),
        Cell::new("Message").fg(Color::White),
        Cell::new("Turns").fg(Color::White),
    ]);

    for record in records.iter().take(limit) {
        let role_cell = if record.result.abuse_detected {
            Cell::new(record.role.label()).fg(Color::Red)
        } else {
            Cell::new(record.role.label())
        };
        table.add_row(vec![
            Cell::new(record.id.as_str()).fg(Color::DarkGrey),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M").to_string()),
            role_cell,
            Cell::new(flag_markers(record)),
            Cell::new(truncate(&record.original_message, 48)),
            Cell::new(record.chat_history.len()),
        ]);
    }

    println!();
    println!("{table}");
    if records.len() > limit {
        println!(
            "  {}",
            style(format!("{} more not shown (use --limit)", records.len() - limit)).dim()
        );
    }
    println!(
        "  Continue a conversation with {}",
        style("lovan resume <id>").yellow()
    );
    println!();
    Ok(())
}

pub async fn resume(state: &mut AppState, id: &str, no_chat: bool, json: bool) -> Result<()> {
    let spinner = spinner("Loading saved analysis...");
    let resumed = state.controller.resume_by_id(id).await.map(|_| ());
    spinner.finish_and_clear();
    resumed.with_context(|| format!("could not resume analysis {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state.controller.view())?);
        return Ok(());
    }

    if let Some(active) = state.controller.active_analysis() {
        print_analysis(active);
    }
    print_transcript(state.controller.thread().turns());

    if !no_chat {
        run_chat_loop(state).await?;
    }
    Ok(())
}
