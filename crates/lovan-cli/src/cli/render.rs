//! Terminal rendering of analyses and chat turns.

use console::{Style, style};

use lovan_types::analysis::{AnalysisResult, FlagSeverity, FlagTag};
use lovan_types::chat::{ActiveAnalysis, AnalysisSource, ChatTurn, Speaker};

fn severity_style(severity: FlagSeverity) -> Style {
    match severity {
        FlagSeverity::Red => Style::new().red().bold(),
        FlagSeverity::Yellow => Style::new().yellow(),
        FlagSeverity::Green => Style::new().green(),
    }
}

pub fn format_flag(flag: &FlagTag) -> String {
    severity_style(flag.severity()).apply_to(flag.text()).to_string()
}

/// Print the full analysis card.
pub fn print_analysis(active: &ActiveAnalysis) {
    let result = active.result();

    println!();
    println!(
        "  {} {}",
        style("Analysis").bold(),
        style(format!("· {}", active.role().label())).dim()
    );
    if let AnalysisSource::Resumed(record_id) = active.source() {
        println!("  {}", style(format!("saved analysis #{record_id}")).dim());
    }
    println!();

    if result.abuse_detected {
        println!(
            "  {} {}",
            style("⚠").red().bold(),
            style("Possible abuse detected. If you feel unsafe, reach out to someone you trust or a local support line.")
                .red()
        );
        println!();
    }

    println!("  {}", style("Context").bold());
    println!("  {}", result.context_summary);
    println!();

    print_flags(result);

    if !result.final_recommendation.is_empty() {
        println!("  {}", style("Recommendation").bold());
        println!("  {}", result.final_recommendation);
        println!();
    }

    if !result.suggested_replies.is_empty() {
        println!("  {}", style("Suggested replies").bold());
        for (i, reply) in result.suggested_replies.iter().enumerate() {
            println!("  {} {reply}", style(format!("{}.", i + 1)).cyan());
        }
        println!();
    }
}

fn print_flags(result: &AnalysisResult) {
    if result.flags.is_empty() {
        return;
    }
    println!("  {}", style("Flags").bold());
    for severity in [FlagSeverity::Red, FlagSeverity::Yellow, FlagSeverity::Green] {
        for flag in result.flags_by_severity(severity) {
            println!("  {} {}", style("•").dim(), format_flag(flag));
        }
    }
    println!();
}

/// Print one chat turn.
pub fn print_turn(turn: &ChatTurn) {
    match (turn.speaker, turn.is_error) {
        (_, true) => println!("  {}", style(&turn.text).red()),
        (Speaker::User, false) => println!("  {} {}", style("you ›").cyan().bold(), turn.text),
        (Speaker::Model, false) => println!("  {} {}", style("lovan ›").magenta().bold(), turn.text),
    }
}

pub fn print_transcript(turns: &[ChatTurn]) {
    if turns.is_empty() {
        return;
    }
    println!("  {}", style("Conversation so far").bold());
    for turn in turns {
        print_turn(turn);
    }
    println!();
}

/// Shorten `text` to at most `max` characters, adding an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() <= max {
        return text;
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
