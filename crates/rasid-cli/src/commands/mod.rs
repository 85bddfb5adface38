//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `audit` - Subscription detection report (remote-first, local fallback)
//! - `spending` - Category breakdown report
//! - `parse` - Raw extraction with parser diagnostics

pub mod audit;
pub mod parse;
pub mod spending;

// Re-export command functions for main.rs
pub use audit::*;
pub use parse::*;
pub use spending::*;

use std::path::Path;

use anyhow::{Context, Result};
use rasid_core::{BankRegistry, FileKind, ParseResult, Transaction};

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Read one statement file and settle its kind (override > sniffing).
pub fn load_statement(path: &Path, kind_override: Option<&str>) -> Result<(Vec<u8>, FileKind)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let kind = match kind_override {
        Some(k) => k
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{}", e))?,
        None => FileKind::sniff(&bytes, path.to_str()),
    };
    Ok((bytes, kind))
}

/// Parse several statements independently and pool the transactions.
///
/// Files share no state; each one runs the full pipeline on its own and
/// a file that fails to yield transactions only contributes warnings.
pub fn parse_files(
    files: &[std::path::PathBuf],
    bank: Option<&str>,
    kind_override: Option<&str>,
    registry: &BankRegistry,
) -> Result<(Vec<ParseResult>, Vec<Transaction>)> {
    let mut results = Vec::new();
    let mut transactions = Vec::new();

    for path in files {
        let (bytes, kind) = load_statement(path, kind_override)?;
        let result = rasid_core::parse_statement(&bytes, kind, bank, registry)?;

        if result.failed() {
            eprintln!(
                "⚠️  {}: no transactions extracted ({})",
                path.display(),
                result
                    .warnings
                    .iter()
                    .map(|w| w.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            eprintln!("   Try exporting as CSV, or pass --bank with your bank's id.");
        }

        transactions.extend(result.transactions.iter().cloned());
        results.push(result);
    }

    Ok((results, transactions))
}
