//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::path::PathBuf;

use rasid_core::{
    BankRegistry, Confidence, FileKind, Frequency, MerchantTable, MockAnalyzer, Subscription,
    SubscriptionStatus,
};
use tempfile::NamedTempFile;

use crate::commands::{self, load_statement, parse_files, run_audit, truncate};

fn write_statement(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn sample_csv() -> &'static str {
    "Date,Description,Amount\n\
     2026-01-15,NETFLIX.COM,59.99\n\
     2026-02-15,NETFLIX.COM,59.99\n\
     2026-03-15,NETFLIX.COM,59.99\n"
}

fn canned_subscription() -> Subscription {
    Subscription {
        id: "deadbeef0000".into(),
        name: "Remote Service".into(),
        normalized_name: "remote service".into(),
        amount: 42.0,
        frequency: Frequency::Monthly,
        monthly_equivalent: 42.0,
        yearly_equivalent: 504.0,
        occurrences: 3,
        first_charge: "2026-01-01".into(),
        last_charge: "2026-03-01".into(),
        status: SubscriptionStatus::Investigate,
        confidence: Confidence::Confirmed,
        source_transactions: vec![],
    }
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly-ten", 11), "exactly-ten");
    assert_eq!(truncate("a much longer string", 10), "a much ...");
}

#[test]
fn test_load_statement_sniffs_csv() {
    let file = write_statement(sample_csv());
    let (bytes, kind) = load_statement(file.path(), None).unwrap();
    assert_eq!(kind, FileKind::Csv);
    assert!(!bytes.is_empty());
}

#[test]
fn test_load_statement_kind_override() {
    let file = write_statement(sample_csv());
    let (_, kind) = load_statement(file.path(), Some("pdf")).unwrap();
    assert_eq!(kind, FileKind::Pdf);
    assert!(load_statement(file.path(), Some("xlsx")).is_err());
}

#[test]
fn test_load_statement_missing_file() {
    assert!(load_statement(&PathBuf::from("/does/not/exist.csv"), None).is_err());
}

#[test]
fn test_parse_files_pools_transactions() {
    let registry = BankRegistry::builtin();
    let a = write_statement(sample_csv());
    let b = write_statement(
        "Date,Description,Amount\n\
         2026-01-20,SPOTIFY AB,21.99\n",
    );
    let files = vec![a.path().to_path_buf(), b.path().to_path_buf()];

    let (results, transactions) = parse_files(&files, None, None, &registry).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(transactions.len(), 4);
}

// ========== Audit Flow Tests ==========

#[tokio::test]
async fn test_run_audit_local_pipeline() {
    let registry = BankRegistry::builtin();
    let merchants = MerchantTable::builtin();
    let file = write_statement(sample_csv());
    let files = vec![file.path().to_path_buf()];

    let report = run_audit(None, &files, None, None, &registry, &merchants)
        .await
        .unwrap();
    assert_eq!(report.subscriptions.len(), 1);
    assert_eq!(report.subscriptions[0].name, "Netflix");
    assert_eq!(report.analyzed_transaction_count, 3);
}

#[tokio::test]
async fn test_run_audit_prefers_healthy_remote() {
    let registry = BankRegistry::builtin();
    let merchants = MerchantTable::builtin();
    let file = write_statement(sample_csv());
    let files = vec![file.path().to_path_buf()];

    let analyzer = MockAnalyzer::new(vec![canned_subscription()]);
    let report = run_audit(
        Some(&analyzer),
        &files,
        None,
        None,
        &registry,
        &merchants,
    )
    .await
    .unwrap();

    // The remote result wins outright; the local pipeline never runs
    assert_eq!(report.subscriptions.len(), 1);
    assert_eq!(report.subscriptions[0].name, "Remote Service");
    assert_eq!(report.total_monthly, 42.0);
}

#[tokio::test]
async fn test_run_audit_falls_back_when_remote_offline() {
    let registry = BankRegistry::builtin();
    let merchants = MerchantTable::builtin();
    let file = write_statement(sample_csv());
    let files = vec![file.path().to_path_buf()];

    let analyzer = MockAnalyzer::unhealthy();
    let report = run_audit(
        Some(&analyzer),
        &files,
        None,
        None,
        &registry,
        &merchants,
    )
    .await
    .unwrap();

    assert_eq!(report.subscriptions.len(), 1);
    assert_eq!(report.subscriptions[0].name, "Netflix");
}

// ========== Command Smoke Tests ==========

#[tokio::test]
async fn test_cmd_audit_json() {
    let file = write_statement(sample_csv());
    let files = vec![file.path().to_path_buf()];
    assert!(commands::cmd_audit(&files, None, None, true).await.is_ok());
}

#[test]
fn test_cmd_spending_json() {
    let file = write_statement(sample_csv());
    let files = vec![file.path().to_path_buf()];
    assert!(commands::cmd_spending(&files, None, None, true).is_ok());
}

#[test]
fn test_cmd_parse_json() {
    let file = write_statement(sample_csv());
    assert!(commands::cmd_parse(file.path(), None, None, true).is_ok());
}
