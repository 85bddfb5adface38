//! Parse/diagnostics command

use std::path::Path;

use anyhow::Result;
use rasid_core::BankRegistry;

use super::{load_statement, truncate};

/// Transactions shown before eliding the rest.
const PREVIEW_ROWS: usize = 15;

pub fn cmd_parse(file: &Path, bank: Option<&str>, kind: Option<&str>, json: bool) -> Result<()> {
    let registry = BankRegistry::builtin();
    let (bytes, file_kind) = load_statement(file, kind)?;
    let result = rasid_core::parse_statement(&bytes, file_kind, bank, &registry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("🧾 {} ({})", file.display(), file_kind);
    println!("   bank: {}  strategy: {}", result.bank_id, result.strategy);
    if !result.warnings.is_empty() {
        println!(
            "   warnings: {}",
            result
                .warnings
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!("   {} transactions extracted", result.transactions.len());

    if result.failed() {
        println!();
        println!("   Nothing could be extracted. Things to try:");
        println!("   - export the statement as CSV instead of PDF");
        println!("   - pass --bank with your bank's id");
        return Ok(());
    }

    println!("   ─────────────────────────────────────────────────────────────");
    for tx in result.transactions.iter().take(PREVIEW_ROWS) {
        println!(
            "   {:12} │ {:40} │ {:>10.2}",
            tx.date,
            truncate(&tx.description, 40),
            tx.amount
        );
    }
    if result.transactions.len() > PREVIEW_ROWS {
        println!(
            "   ... and {} more",
            result.transactions.len() - PREVIEW_ROWS
        );
    }

    Ok(())
}
