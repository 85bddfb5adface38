//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Rasid - Find the subscriptions hiding in your bank statements
#[derive(Parser)]
#[command(name = "rasid")]
#[command(about = "Bank statement subscription auditor", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect subscriptions across one or more statements
    Audit {
        /// Statement file(s) to analyze (CSV or PDF); repeatable
        #[arg(short, long, required = true)]
        file: Vec<PathBuf>,

        /// Bank id (auto-detected if not specified)
        #[arg(short, long)]
        bank: Option<String>,

        /// Force the file kind instead of sniffing: csv or pdf
        #[arg(short, long)]
        kind: Option<String>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the spending breakdown by category
    Spending {
        /// Statement file(s) to analyze (CSV or PDF); repeatable
        #[arg(short, long, required = true)]
        file: Vec<PathBuf>,

        /// Bank id (auto-detected if not specified)
        #[arg(short, long)]
        bank: Option<String>,

        /// Force the file kind instead of sniffing: csv or pdf
        #[arg(short, long)]
        kind: Option<String>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract transactions and show parser diagnostics
    Parse {
        /// Statement file to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Bank id (auto-detected if not specified)
        #[arg(short, long)]
        bank: Option<String>,

        /// Force the file kind instead of sniffing: csv or pdf
        #[arg(short, long)]
        kind: Option<String>,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },
}
