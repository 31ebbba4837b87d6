//! sitemapgen CLI - chunked sitemap generation
//!
//! This is the main entry point for the sitemapgen command-line interface.
//! Command implementations live in the `commands` module.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;
mod commands;
mod error;

use cli::{Cli, Commands};
use error::category_from_error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(&cli) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match execute_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let category = category_from_error(&e);
            eprintln!("Error: {e:#}");
            tracing::debug!(%category, code = category.exit_code(), "Command failed");
            category.as_exit_code()
        },
    }
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    if cli.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn execute_command(cli: Cli) -> Result<()> {
    let config_path = cli.config;

    match cli.command {
        Commands::Generate(args) => {
            commands::generate(&args, config_path.as_deref()).await?;
        },
        Commands::Config { command } => {
            commands::run_config(command, config_path.as_deref())?;
        },
        Commands::Check { command } => {
            commands::run_check(&command)?;
        },
    }

    Ok(())
}
