//! Subscription audit command

use std::path::PathBuf;

use anyhow::Result;
use rasid_core::{
    AuditReport, BankRegistry, Confidence, MerchantTable, StatementAnalyzer, SubscriptionAuditor,
};

use super::{parse_files, truncate};

pub async fn cmd_audit(
    files: &[PathBuf],
    bank: Option<&str>,
    kind: Option<&str>,
    json: bool,
) -> Result<()> {
    let registry = BankRegistry::builtin();
    let merchants = MerchantTable::builtin();

    // No remote analyzer ships with the CLI build; the parameter keeps
    // the remote-first flow wired for callers that have one.
    let report = run_audit(None, files, bank, kind, &registry, &merchants).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

/// Remote-first, local-fallback subscription detection.
///
/// When an analyzer is supplied and healthy it gets the whole files and
/// its pre-classified list wins; any analyzer failure falls back to the
/// local pipeline with no shared state between the two attempts.
pub async fn run_audit(
    analyzer: Option<&dyn StatementAnalyzer>,
    files: &[PathBuf],
    bank: Option<&str>,
    kind: Option<&str>,
    registry: &BankRegistry,
    merchants: &MerchantTable,
) -> Result<AuditReport> {
    if let Some(analyzer) = analyzer {
        if analyzer.health_check().await {
            match remote_audit(analyzer, files, kind).await {
                Ok(report) => return Ok(report),
                Err(e) => {
                    tracing::warn!(error = %e, "remote analyzer failed, using local pipeline");
                }
            }
        } else {
            tracing::debug!("remote analyzer unavailable, using local pipeline");
        }
    }

    let (_, transactions) = parse_files(files, bank, kind, registry)?;
    Ok(SubscriptionAuditor::new(merchants).audit(&transactions))
}

async fn remote_audit(
    analyzer: &dyn StatementAnalyzer,
    files: &[PathBuf],
    kind: Option<&str>,
) -> Result<AuditReport> {
    let mut subscriptions = Vec::new();
    for path in files {
        let (bytes, file_kind) = super::load_statement(path, kind)?;
        let mut subs = analyzer
            .analyze(&bytes, file_kind)
            .await
            .map_err(anyhow::Error::from)?;
        subscriptions.append(&mut subs);
    }
    let analyzed: usize = subscriptions
        .iter()
        .map(|s| s.source_transactions.len())
        .sum();
    Ok(AuditReport::from_subscriptions(subscriptions, analyzed, None))
}

fn print_report(report: &AuditReport) {
    if report.subscriptions.is_empty() {
        println!("No recurring charges detected.");
        println!(
            "   Analyzed {} transactions.",
            report.analyzed_transaction_count
        );
        return;
    }

    println!();
    println!("📋 Detected Subscriptions");
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in &report.subscriptions {
        let confidence_icon = match sub.confidence {
            Confidence::Confirmed => "✅",
            Confidence::Suspicious => "❓",
        };

        println!(
            "   {} {:24} │ {:>9.2}/mo │ {:9} │ {}x │ since {}",
            confidence_icon,
            truncate(&sub.name, 24),
            sub.monthly_equivalent,
            sub.frequency.as_str(),
            sub.occurrences,
            sub.first_charge
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Total: {:.2} SAR/month ({:.2} SAR/year) across {} subscriptions",
        report.total_monthly,
        report.total_yearly,
        report.subscriptions.len()
    );
    if let Some(range) = &report.date_range {
        println!(
            "   From {} transactions between {} and {}",
            report.analyzed_transaction_count, range.from, range.to
        );
    }
    println!();
    println!("   ❓ = recurring pattern found but unconfirmed; review before cancelling");
}
