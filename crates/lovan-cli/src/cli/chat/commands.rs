//! Slash command parsing for the chat loop.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Save the conversation to the resumed history record.
    Save,
    /// Log in without leaving the chat.
    Login,
    /// Print the conversation so far.
    Transcript,
    /// Close the analysis and leave the chat.
    New,
    /// Leave the chat.
    Exit,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/save" => Some(ChatCommand::Save),
        "/login" => Some(ChatCommand::Login),
        "/history" | "/transcript" => Some(ChatCommand::Transcript),
        "/new" => Some(ChatCommand::New),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Commands").bold());
    for (cmd, help) in [
        ("/save", "save this conversation to your history"),
        ("/login", "log in to unlock the chat"),
        ("/history", "show the conversation so far"),
        ("/new", "close this analysis"),
        ("/quit", "leave the chat"),
    ] {
        println!("  {:<10} {}", style(cmd).cyan(), help);
    }
    println!();
}
