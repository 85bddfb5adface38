//! Spending breakdown command

use std::path::PathBuf;

use anyhow::Result;
use rasid_core::{
    breakdown, subscription_takeaway, BankRegistry, CategoryTable, MerchantTable,
    SubscriptionAuditor,
};

use super::{parse_files, truncate};

pub fn cmd_spending(
    files: &[PathBuf],
    bank: Option<&str>,
    kind: Option<&str>,
    json: bool,
) -> Result<()> {
    let registry = BankRegistry::builtin();
    let (_, transactions) = parse_files(files, bank, kind, &registry)?;

    let table = CategoryTable::builtin();
    let mut report = breakdown(&transactions, &table);

    // The subscriptions takeaway needs the audit; bolt it on here so the
    // categorizer itself stays independent of detection
    let merchants = MerchantTable::builtin();
    let audit = SubscriptionAuditor::new(&merchants).audit(&transactions);
    if let Some(line) = subscription_takeaway(&audit) {
        report.takeaways.push(line);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.categories.is_empty() {
        println!("No spending found in the supplied statements.");
        return Ok(());
    }

    println!();
    println!("💳 Spending Breakdown");
    println!("   ─────────────────────────────────────────────────────────────");

    for category in &report.categories {
        println!(
            "   {:22} │ {:>10.2} │ {:>5.1}% │ {:>3} txns",
            truncate(&category.name, 22),
            category.total,
            category.percent,
            category.transaction_count
        );
        let merchants: Vec<&str> = category
            .top_merchants
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        if !merchants.is_empty() {
            println!("      top: {}", truncate(&merchants.join(", "), 55));
        }
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Total: {:.2} SAR over ~{:.1} months ({:.2} SAR/month)",
        report.total_spend, report.months, report.monthly_average
    );

    if !report.takeaways.is_empty() {
        println!();
        for takeaway in &report.takeaways {
            println!("   💡 {}", takeaway);
        }
    }

    Ok(())
}
