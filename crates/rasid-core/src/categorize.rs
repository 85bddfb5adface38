//! Spending categorization
//!
//! Buckets every transaction into a spend category for the breakdown
//! view. Fully independent of subscription detection: the category table
//! is its own ordered keyword list, scanned first-match-wins, with
//! unmatched spend landing in "Other".

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

use crate::models::{
    AuditReport, CategorySpend, DateRange, MerchantSpend, SpendingBreakdown, Transaction,
};

/// Average days per month used for month-span estimation.
const DAYS_PER_MONTH: f64 = 30.44;

/// Merchants surfaced per category.
const TOP_MERCHANTS: usize = 3;

/// Characters that end the merchant-name portion of a description.
const MERCHANT_SEPARATORS: [char; 5] = ['*', '-', '|', ',', '#'];

/// One spend category and its match keywords
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered category table; scan order encodes precedence
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    /// Built-in categories for Saudi retail spending, English and Arabic
    /// keywords both. "Careem food" sits in delivery above the bare
    /// "careem" ride keyword in transport, so declaration order matters.
    pub fn builtin() -> Self {
        let rules = vec![
            rule(
                "Food Delivery",
                &[
                    "hungerstation",
                    "jahez",
                    "mrsool",
                    "toyou",
                    "talabat",
                    "careem food",
                    "deliveroo",
                    "هنقرستيشن",
                    "جاهز",
                    "مرسول",
                ],
            ),
            rule(
                "Groceries",
                &[
                    "panda",
                    "tamimi",
                    "danube",
                    "carrefour",
                    "lulu",
                    "othaim",
                    "nesto",
                    "supermarket",
                    "hypermarket",
                    "بنده",
                    "التميمي",
                    "الدانوب",
                    "العثيم",
                    "كارفور",
                    "لولو",
                ],
            ),
            rule(
                "Dining",
                &[
                    "restaurant",
                    "cafe",
                    "coffee",
                    "starbucks",
                    "mcdonald",
                    "albaik",
                    "dunkin",
                    "barns",
                    "مطعم",
                    "كافيه",
                    "قهوة",
                    "البيك",
                ],
            ),
            rule(
                "Transport",
                &[
                    "uber",
                    "careem",
                    "petrol",
                    "gas station",
                    "aramco",
                    "sasco",
                    "fuel",
                    "parking",
                    "وقود",
                    "محطة",
                    "أوبر",
                    "كريم",
                ],
            ),
            rule(
                "Telecom & Utilities",
                &[
                    "stc",
                    "mobily",
                    "zain",
                    "virgin mobile",
                    "electricity",
                    "water bill",
                    "كهرباء",
                    "مياه",
                    "فاتورة",
                    "موبايلي",
                    "زين",
                ],
            ),
            rule(
                "Shopping",
                &[
                    "amazon",
                    "noon",
                    "shein",
                    "namshi",
                    "jarir",
                    "ikea",
                    "extra",
                    "zara",
                    "نون",
                    "شي ان",
                    "جرير",
                    "نمشي",
                    "إكسترا",
                ],
            ),
            rule(
                "Entertainment",
                &[
                    "netflix",
                    "shahid",
                    "spotify",
                    "anghami",
                    "osn",
                    "cinema",
                    "vox",
                    "muvi",
                    "playstation",
                    "سينما",
                    "شاهد",
                    "نتفلكس",
                    "أنغامي",
                ],
            ),
            rule(
                "Health",
                &[
                    "pharmacy",
                    "nahdi",
                    "dawaa",
                    "clinic",
                    "hospital",
                    "dental",
                    "صيدلية",
                    "النهدي",
                    "الدواء",
                    "مستشفى",
                    "عيادة",
                ],
            ),
            rule(
                "Travel",
                &[
                    "saudia",
                    "flynas",
                    "flyadeal",
                    "airline",
                    "hotel",
                    "booking.com",
                    "airbnb",
                    "طيران",
                    "فندق",
                    "الخطوط",
                ],
            ),
        ];
        Self { rules }
    }

    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// First matching category in declared order; None means "Other".
    pub fn classify(&self, description: &str) -> Option<&str> {
        let haystack = description.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw.as_str())))
            .map(|rule| rule.name.as_str())
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn rule(name: &str, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        name: name.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
    }
}

/// Bucket a ledger into the spending breakdown report.
pub fn breakdown(transactions: &[Transaction], table: &CategoryTable) -> SpendingBreakdown {
    struct Bucket {
        total: f64,
        count: usize,
        merchants: HashMap<String, f64>,
    }

    let mut buckets: HashMap<&str, Bucket> = HashMap::new();
    let mut total_spend = 0.0;

    for tx in transactions {
        if tx.amount <= 0.0 {
            continue;
        }
        total_spend += tx.amount;
        let category = table.classify(&tx.description).unwrap_or("Other");
        let bucket = buckets.entry(category).or_insert_with(|| Bucket {
            total: 0.0,
            count: 0,
            merchants: HashMap::new(),
        });
        bucket.total += tx.amount;
        bucket.count += 1;
        *bucket
            .merchants
            .entry(merchant_name(&tx.description))
            .or_insert(0.0) += tx.amount;
    }

    let range = ledger_range(transactions);
    let months = month_span(&range);

    let mut categories: Vec<CategorySpend> = buckets
        .into_iter()
        .map(|(name, bucket)| {
            let mut merchants: Vec<MerchantSpend> = bucket
                .merchants
                .into_iter()
                .map(|(name, total)| MerchantSpend {
                    name,
                    total: round2(total),
                })
                .collect();
            merchants.sort_by(|a, b| {
                b.total
                    .partial_cmp(&a.total)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.name.cmp(&b.name))
            });
            merchants.truncate(TOP_MERCHANTS);

            let percent = if total_spend > 0.0 {
                round2(bucket.total / total_spend * 100.0)
            } else {
                0.0
            };

            CategorySpend {
                name: name.to_string(),
                total: round2(bucket.total),
                percent,
                monthly_average: round2(bucket.total / months),
                transaction_count: bucket.count,
                top_merchants: merchants,
            }
        })
        .collect();

    categories.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    let takeaways = build_takeaways(transactions, &categories, total_spend);

    SpendingBreakdown {
        total_spend: round2(total_spend),
        monthly_average: round2(total_spend / months),
        categories,
        date_range: range,
        months: round2(months),
        takeaways,
    }
}

/// Takeaway line for the subscriptions burden; lives here so the CLI can
/// append it when an audit is available without coupling the categorizer
/// to the detector.
pub fn subscription_takeaway(report: &AuditReport) -> Option<String> {
    if report.subscriptions.is_empty() {
        return None;
    }
    Some(format!(
        "Subscriptions cost you {:.2} SAR every month ({} detected)",
        report.total_monthly,
        report.subscriptions.len()
    ))
}

/// The merchant-name portion of a description: everything before the
/// first separator character.
fn merchant_name(description: &str) -> String {
    let cut = description
        .find(&MERCHANT_SEPARATORS[..])
        .unwrap_or(description.len());
    let name = description[..cut].trim();
    if name.is_empty() {
        description.trim().to_string()
    } else {
        name.to_string()
    }
}

fn ledger_range(transactions: &[Transaction]) -> Option<DateRange> {
    let dates: Vec<NaiveDate> = transactions.iter().filter_map(|t| t.date_parsed()).collect();
    let min = dates.iter().min()?;
    let max = dates.iter().max()?;
    Some(DateRange {
        from: min.format("%Y-%m-%d").to_string(),
        to: max.format("%Y-%m-%d").to_string(),
    })
}

/// Approximate month count from the ledger's day span, never below one.
fn month_span(range: &Option<DateRange>) -> f64 {
    let Some(range) = range else { return 1.0 };
    let from = NaiveDate::parse_from_str(&range.from, "%Y-%m-%d");
    let to = NaiveDate::parse_from_str(&range.to, "%Y-%m-%d");
    match (from, to) {
        (Ok(from), Ok(to)) => {
            let days = (to - from).num_days() as f64;
            (days / DAYS_PER_MONTH).max(1.0)
        }
        _ => 1.0,
    }
}

/// Natural-language observations. Presentation hints, not contract.
fn build_takeaways(
    transactions: &[Transaction],
    categories: &[CategorySpend],
    total_spend: f64,
) -> Vec<String> {
    let mut takeaways = Vec::new();

    if let Some(largest) = categories.first() {
        if total_spend > 0.0 {
            takeaways.push(format!(
                "{} is your largest category at {:.2} SAR ({:.0}% of spend)",
                largest.name, largest.total, largest.percent
            ));
        }
    }

    let total_of = |name: &str| {
        categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.total)
            .unwrap_or(0.0)
    };
    let delivery = total_of("Food Delivery");
    let groceries = total_of("Groceries");
    if delivery > 0.0 && groceries > 0.0 {
        takeaways.push(format!(
            "You spent {:.1}x on food delivery versus groceries",
            delivery / groceries
        ));
    }

    // Biggest single month by dated spend
    let mut by_month: HashMap<(i32, u32), f64> = HashMap::new();
    for tx in transactions {
        if tx.amount <= 0.0 {
            continue;
        }
        if let Some(date) = tx.date_parsed() {
            *by_month.entry((date.year(), date.month())).or_insert(0.0) += tx.amount;
        }
    }
    if by_month.len() > 1 {
        if let Some(((year, month), total)) = by_month
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        {
            let name = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_else(|| format!("{}-{:02}", year, month));
            takeaways.push(format!(
                "{} was your biggest month at {:.2} SAR",
                name, total
            ));
        }
    }

    takeaways
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
