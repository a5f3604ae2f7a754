//! CLI command definitions for the `lovan` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod analyze;
pub mod auth;
pub mod chat;
pub mod history;
pub mod render;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

/// Understand the messages you receive before you answer them.
#[derive(Parser)]
#[command(name = "lovan", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors. Command results are still printed.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend base URL (overrides LOVAN_API_URL and config.toml).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Export tracing spans to stdout through OpenTelemetry.
    #[arg(long, global = true, hide = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a message you received.
    Analyze {
        /// Who sent it (pareja, esposo, amigo, familiar, crush, ex).
        #[arg(short, long)]
        role: Option<String>,

        /// The message text. Prompted for when omitted.
        message: Option<String>,

        /// Accept the privacy notice without asking.
        #[arg(short, long)]
        yes: bool,

        /// Continue with follow-up questions after the results.
        #[arg(long)]
        chat: bool,
    },

    /// List the relationship roles an analysis can be made for.
    Roles,

    /// Log in and remember the session.
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account.
    Register {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Forget the stored session.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// List your saved analyses.
    #[command(alias = "ls")]
    History {
        /// Maximum rows to show.
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Reopen a saved analysis and continue its conversation.
    Resume {
        /// History record id (see `lovan history`).
        id: String,

        /// Print the analysis and transcript without entering the chat.
        #[arg(long)]
        no_chat: bool,
    },

    /// Check that the backend is reachable.
    Health,
}

/// Spinner shown while waiting on the backend.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
