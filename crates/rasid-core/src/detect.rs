//! Recurrence detection
//!
//! Groups the ledger by merchant key, infers billing frequency from
//! inter-charge intervals, validates amount consistency and produces the
//! subscription audit. Groups that fail a check are not dropped; they are
//! kept with `confidence = suspicious` so a human confirms or rejects them.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use crate::merchants::{merchant_key, MerchantTable};
use crate::models::{
    AuditReport, Confidence, DateRange, Frequency, Subscription, SubscriptionStatus, Transaction,
};

/// Thresholds for recurrence classification
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Allowed deviation from the mean amount, as a fraction
    pub amount_tolerance: f64,
    /// Mean-interval upper bounds (inclusive) per frequency, in days
    pub weekly_max_days: f64,
    pub monthly_max_days: f64,
    pub quarterly_max_days: f64,
    pub yearly_max_days: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: 0.15,
            weekly_max_days: 10.0,
            monthly_max_days: 45.0,
            quarterly_max_days: 120.0,
            yearly_max_days: 400.0,
        }
    }
}

/// Transient merchant grouping used during detection
struct MerchantGroup<'a> {
    name: String,
    known: bool,
    transactions: Vec<&'a Transaction>,
}

/// Runs recurrence detection over an extracted ledger
pub struct SubscriptionAuditor<'a> {
    merchants: &'a MerchantTable,
    config: AuditConfig,
}

impl<'a> SubscriptionAuditor<'a> {
    pub fn new(merchants: &'a MerchantTable) -> Self {
        Self {
            merchants,
            config: AuditConfig::default(),
        }
    }

    pub fn with_config(merchants: &'a MerchantTable, config: AuditConfig) -> Self {
        Self { merchants, config }
    }

    /// Produce the subscription audit for one upload.
    pub fn audit(&self, transactions: &[Transaction]) -> AuditReport {
        let mut groups: HashMap<String, MerchantGroup> = HashMap::new();

        for tx in transactions {
            if tx.amount <= 0.0 {
                continue;
            }
            let (key, name, known) = match self.merchants.classify(&tx.description) {
                Some(canonical) => (canonical.to_lowercase(), canonical.to_string(), {
                    self.merchants.is_definite(canonical)
                }),
                None => {
                    let key = merchant_key(&tx.description);
                    if key.is_empty() {
                        continue;
                    }
                    (key, tx.description.trim().to_string(), false)
                }
            };

            groups
                .entry(key)
                .or_insert_with(|| MerchantGroup {
                    name,
                    known,
                    transactions: Vec::new(),
                })
                .transactions
                .push(tx);
        }

        let mut subscriptions: Vec<Subscription> = Vec::new();
        for (key, group) in groups {
            if let Some(sub) = self.evaluate_group(&key, &group) {
                subscriptions.push(sub);
            }
        }

        AuditReport::from_subscriptions(subscriptions, transactions.len(), date_range(transactions))
    }

    /// Decide whether one merchant group is a subscription.
    fn evaluate_group(&self, key: &str, group: &MerchantGroup) -> Option<Subscription> {
        let txs = &group.transactions;

        if txs.len() == 1 {
            // One charge is evidence only for definite known services
            if !group.known {
                return None;
            }
            return Some(self.build_subscription(
                key,
                group,
                Frequency::Monthly,
                Confidence::Confirmed,
            ));
        }

        let amounts: Vec<f64> = txs.iter().map(|t| t.amount).collect();
        let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
        let amounts_consistent = mean > 0.0
            && amounts
                .iter()
                .all(|a| (a - mean).abs() / mean <= self.config.amount_tolerance);

        let frequency = self.classify_frequency(txs);

        match (amounts_consistent, frequency) {
            (true, Some(freq)) => {
                let confidence = if group.known {
                    Confidence::Confirmed
                } else {
                    Confidence::Suspicious
                };
                Some(self.build_subscription(key, group, freq, confidence))
            }
            _ => {
                // Inconsistent amounts or unresolvable cadence: keep it,
                // default to monthly, let the user decide
                debug!(
                    merchant = key,
                    consistent = amounts_consistent,
                    "irregular group kept as suspicious"
                );
                Some(self.build_subscription(
                    key,
                    group,
                    Frequency::Monthly,
                    Confidence::Suspicious,
                ))
            }
        }
    }

    /// Classify billing cadence from the mean inter-charge interval.
    fn classify_frequency(&self, txs: &[&Transaction]) -> Option<Frequency> {
        let mut dates: Vec<NaiveDate> = txs.iter().filter_map(|t| t.date_parsed()).collect();
        if dates.len() < 2 {
            return None;
        }
        dates.sort();

        let intervals: Vec<i64> = dates
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .collect();
        let mean = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

        if mean <= self.config.weekly_max_days {
            Some(Frequency::Weekly)
        } else if mean <= self.config.monthly_max_days {
            Some(Frequency::Monthly)
        } else if mean <= self.config.quarterly_max_days {
            Some(Frequency::Quarterly)
        } else if mean <= self.config.yearly_max_days {
            Some(Frequency::Yearly)
        } else {
            None
        }
    }

    fn build_subscription(
        &self,
        key: &str,
        group: &MerchantGroup,
        frequency: Frequency,
        confidence: Confidence,
    ) -> Subscription {
        let mut txs: Vec<Transaction> = group.transactions.iter().map(|t| (*t).clone()).collect();
        txs.sort_by(|a, b| match (a.date_parsed(), b.date_parsed()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let amount = round2(txs.iter().map(|t| t.amount).sum::<f64>() / txs.len() as f64);
        let monthly_equivalent = round2(frequency.monthly_equivalent(amount));
        let yearly_equivalent = round2(monthly_equivalent * 12.0);

        Subscription {
            id: subscription_id(key),
            name: group.name.clone(),
            normalized_name: key.to_string(),
            amount,
            frequency,
            monthly_equivalent,
            yearly_equivalent,
            occurrences: txs.len(),
            first_charge: txs.first().map(|t| t.date.clone()).unwrap_or_default(),
            last_charge: txs.last().map(|t| t.date.clone()).unwrap_or_default(),
            status: SubscriptionStatus::default(),
            confidence,
            source_transactions: txs,
        }
    }
}

/// Stable short id derived from the normalized merchant name.
fn subscription_id(normalized_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_name.as_bytes());
    hex::encode(hasher.finalize())[..12].to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Inclusive ISO date range over every dated transaction.
fn date_range(transactions: &[Transaction]) -> Option<DateRange> {
    let dates: Vec<NaiveDate> = transactions.iter().filter_map(|t| t.date_parsed()).collect();
    let min = dates.iter().min()?;
    let max = dates.iter().max()?;
    Some(DateRange {
        from: min.format("%Y-%m-%d").to_string(),
        to: max.format("%Y-%m-%d").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: &str, description: &str, amount: f64) -> Transaction {
        Transaction {
            date: date.to_string(),
            description: description.to_string(),
            amount,
            reference: None,
        }
    }

    fn audit(transactions: &[Transaction]) -> AuditReport {
        let table = MerchantTable::builtin();
        SubscriptionAuditor::new(&table).audit(transactions)
    }

    fn pair_days_apart(days: i64) -> Vec<Transaction> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let second = start + chrono::Duration::days(days);
        vec![
            tx(&start.to_string(), "NETFLIX.COM", 59.99),
            tx(&second.to_string(), "NETFLIX.COM", 59.99),
        ]
    }

    #[test]
    fn test_frequency_boundaries() {
        let cases = [
            (10, Frequency::Weekly),
            (11, Frequency::Monthly),
            (45, Frequency::Monthly),
            (46, Frequency::Quarterly),
            (120, Frequency::Quarterly),
            (121, Frequency::Yearly),
            (400, Frequency::Yearly),
        ];
        for (days, expected) in cases {
            let report = audit(&pair_days_apart(days));
            assert_eq!(
                report.subscriptions[0].frequency, expected,
                "{} days apart",
                days
            );
            assert_eq!(report.subscriptions[0].confidence, Confidence::Confirmed);
        }
    }

    #[test]
    fn test_interval_past_yearly_is_undetermined() {
        // Beyond the yearly bound the cadence check fails; group is kept
        // as monthly/suspicious rather than dropped
        let report = audit(&pair_days_apart(450));
        assert_eq!(report.subscriptions.len(), 1);
        assert_eq!(report.subscriptions[0].frequency, Frequency::Monthly);
        assert_eq!(report.subscriptions[0].confidence, Confidence::Suspicious);
    }

    #[test]
    fn test_amount_consistency_pass() {
        let txs = vec![
            tx("2026-01-01", "NETFLIX.COM", 100.0),
            tx("2026-02-01", "NETFLIX.COM", 105.0),
            tx("2026-03-01", "NETFLIX.COM", 98.0),
        ];
        let report = audit(&txs);
        assert_eq!(report.subscriptions[0].confidence, Confidence::Confirmed);
        assert_eq!(report.subscriptions[0].frequency, Frequency::Monthly);
    }

    #[test]
    fn test_amount_consistency_fail() {
        let txs = vec![
            tx("2026-01-01", "NETFLIX.COM", 100.0),
            tx("2026-02-01", "NETFLIX.COM", 150.0),
        ];
        let report = audit(&txs);
        // Kept, but flagged for the user
        assert_eq!(report.subscriptions[0].confidence, Confidence::Suspicious);
        assert_eq!(report.subscriptions[0].frequency, Frequency::Monthly);
    }

    #[test]
    fn test_single_occurrence_known_service() {
        let report = audit(&[tx("2026-01-15", "SPOTIFY AB", 21.99)]);
        assert_eq!(report.subscriptions.len(), 1);
        let sub = &report.subscriptions[0];
        assert_eq!(sub.name, "Spotify");
        assert_eq!(sub.confidence, Confidence::Confirmed);
        assert_eq!(sub.occurrences, 1);
    }

    #[test]
    fn test_single_occurrence_unknown_discarded() {
        let report = audit(&[tx("2026-01-15", "CORNER BAKERY", 35.0)]);
        assert!(report.subscriptions.is_empty());
    }

    #[test]
    fn test_unknown_inconsistent_merchant_kept_suspicious() {
        let txs = vec![
            tx("2026-01-01", "ARAMCO محطة وقود", 150.0),
            tx("2026-01-25", "ARAMCO محطة وقود", 320.0),
            tx("2026-03-01", "ARAMCO محطة وقود", 90.0),
        ];
        let report = audit(&txs);
        assert_eq!(report.subscriptions.len(), 1);
        let sub = &report.subscriptions[0];
        assert_eq!(sub.confidence, Confidence::Suspicious);
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.occurrences, 3);
    }

    #[test]
    fn test_netflix_end_to_end() {
        let txs = vec![
            tx("2026-01-15", "NETFLIX.COM", 59.99),
            tx("2026-02-15", "NETFLIX.COM", 59.99),
            tx("2026-03-15", "NETFLIX.COM", 59.99),
            tx("2026-04-15", "NETFLIX.COM", 59.99),
        ];
        let report = audit(&txs);
        assert_eq!(report.subscriptions.len(), 1);
        let sub = &report.subscriptions[0];
        assert_eq!(sub.name, "Netflix");
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.monthly_equivalent, 59.99);
        assert_eq!(sub.yearly_equivalent, 719.88);
        assert_eq!(sub.confidence, Confidence::Confirmed);
        assert_eq!(sub.first_charge, "2026-01-15");
        assert_eq!(sub.last_charge, "2026-04-15");
        assert_eq!(sub.status, SubscriptionStatus::Investigate);
    }

    #[test]
    fn test_totals_match_sum_of_equivalents() {
        let txs = vec![
            tx("2026-01-15", "NETFLIX.COM", 59.99),
            tx("2026-02-15", "NETFLIX.COM", 59.99),
            tx("2026-01-20", "SPOTIFY AB", 21.99),
            tx("2026-02-20", "SPOTIFY AB", 21.99),
            tx("2026-01-05", "ANGHAMI PLUS", 19.99),
            tx("2026-02-05", "ANGHAMI PLUS", 19.99),
        ];
        let report = audit(&txs);
        let sum: f64 = report
            .subscriptions
            .iter()
            .map(|s| s.monthly_equivalent)
            .sum();
        assert!((report.total_monthly - round2(sum)).abs() < 0.01 * report.subscriptions.len() as f64 + f64::EPSILON);
        // Sorted descending by monthly equivalent
        let monthlies: Vec<f64> = report
            .subscriptions
            .iter()
            .map(|s| s.monthly_equivalent)
            .collect();
        let mut sorted = monthlies.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(monthlies, sorted);
    }

    #[test]
    fn test_weekly_monthly_equivalent() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let txs: Vec<Transaction> = (0..4)
            .map(|i| {
                let date = start + chrono::Duration::days(7 * i);
                tx(&date.to_string(), "CHATGPT SUBSCRIPTION", 10.0)
            })
            .collect();
        let report = audit(&txs);
        let sub = &report.subscriptions[0];
        assert_eq!(sub.frequency, Frequency::Weekly);
        assert_eq!(sub.monthly_equivalent, 43.3);
        assert_eq!(sub.yearly_equivalent, 519.6);
    }

    #[test]
    fn test_stable_ids() {
        let report_a = audit(&pair_days_apart(30));
        let report_b = audit(&pair_days_apart(30));
        assert_eq!(report_a.subscriptions[0].id, report_b.subscriptions[0].id);
        assert_eq!(report_a.subscriptions[0].id.len(), 12);
    }

    #[test]
    fn test_date_range() {
        let txs = vec![
            tx("2026-03-15", "NETFLIX.COM", 59.99),
            tx("2026-01-02", "JAHEZ", 40.0),
            tx("not-a-date", "JAHEZ", 40.0),
        ];
        let report = audit(&txs);
        let range = report.date_range.unwrap();
        assert_eq!(range.from, "2026-01-02");
        assert_eq!(range.to, "2026-03-15");
    }
}
