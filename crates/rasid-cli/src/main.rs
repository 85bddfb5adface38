//! Rasid CLI - Bank statement subscription auditor
//!
//! Usage:
//!   rasid audit --file statement.csv      Detect subscriptions
//!   rasid spending --file statement.pdf   Spending breakdown
//!   rasid parse --file statement.csv      Parser diagnostics

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Audit {
            file,
            bank,
            kind,
            json,
        } => commands::cmd_audit(&file, bank.as_deref(), kind.as_deref(), json).await,
        Commands::Spending {
            file,
            bank,
            kind,
            json,
        } => commands::cmd_spending(&file, bank.as_deref(), kind.as_deref(), json),
        Commands::Parse {
            file,
            bank,
            kind,
            json,
        } => commands::cmd_parse(&file, bank.as_deref(), kind.as_deref(), json),
    }
}
