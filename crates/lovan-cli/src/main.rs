//! Lovan CLI entry point.
//!
//! Binary name: `lovan`
//!
//! Parses CLI arguments, loads configuration, restores the stored session,
//! then dispatches to the command handler.

mod cli;
mod state;

use anyhow::Context;
use clap::Parser;
use console::style;

use lovan_infra::http::HttpBackend;
use lovan_infra::config::resolve_api_base_url;
use lovan_observe::tracing_setup::{TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, data_dir) = AppState::load_config().await;

    if let Err(e) = init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet).to_string(),
        format: config.log_format,
        enable_otel: cli.otel,
    }) {
        eprintln!("Warning: tracing setup failed: {e}");
    }

    let result = run(cli, config, data_dir).await;
    shutdown_tracing();
    result
}

async fn run(
    cli: Cli,
    config: lovan_types::config::ClientConfig,
    data_dir: std::path::PathBuf,
) -> anyhow::Result<()> {
    // Commands that never touch the session
    match &cli.command {
        Commands::Roles => return cli::analyze::list_roles(cli.json),
        Commands::Health => {
            let backend =
                HttpBackend::from_config(&config, resolve_api_base_url(&config, cli.api_url.as_deref()));
            return health(&backend, cli.json).await;
        }
        _ => {}
    }

    let mut state = AppState::init(config, data_dir, cli.api_url.as_deref()).await?;

    match cli.command {
        Commands::Analyze {
            role,
            message,
            yes,
            chat,
        } => {
            cli::analyze::analyze(&mut state, role, message, yes, chat, cli.json).await?;
        }

        Commands::Login { email } => {
            cli::auth::login(&mut state, email, cli.json).await?;
        }

        Commands::Register { email } => {
            cli::auth::register(&state, email, cli.json).await?;
        }

        Commands::Logout => {
            cli::auth::logout(&mut state, cli.json).await?;
        }

        Commands::Whoami => {
            cli::auth::whoami(&state, cli.json)?;
        }

        Commands::History { limit } => {
            cli::history::list_history(&state, limit, cli.json).await?;
        }

        Commands::Resume { id, no_chat } => {
            cli::history::resume(&mut state, &id, no_chat || cli.json, cli.json).await?;
        }

        Commands::Roles | Commands::Health => unreachable!("handled above"),
    }

    Ok(())
}

async fn health(backend: &HttpBackend, json: bool) -> anyhow::Result<()> {
    let status = backend
        .health()
        .await
        .with_context(|| format!("backend at {} is not reachable", backend.base_url()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let mark = if status.is_ok() {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    println!(
        "  {mark} {} {} ({})",
        status.service,
        style(&status.status).bold(),
        style(backend.base_url()).dim()
    );
    Ok(())
}
