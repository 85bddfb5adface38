//! Domain models for Rasid

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of statement file supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Pdf,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    /// Guess the kind from raw bytes and an optional file name.
    ///
    /// `%PDF-` magic wins over the extension; everything else is treated
    /// as delimited text.
    pub fn sniff(bytes: &[u8], file_name: Option<&str>) -> Self {
        if bytes.starts_with(b"%PDF-") {
            return Self::Pdf;
        }
        if let Some(name) = file_name {
            if name.to_lowercase().ends_with(".pdf") {
                return Self::Pdf;
            }
        }
        Self::Csv
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            _ => Err(format!("Unknown file kind: {}", s)),
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single extracted debit transaction
///
/// Amounts are always non-negative outflows; credits and deposits are
/// excluded during extraction. `date` is ISO `YYYY-MM-DD` when the source
/// token was parseable, otherwise the raw token is kept as a weak signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Transaction {
    /// Re-parse the date field. Only ISO dates round-trip; raw fallback
    /// tokens yield None and simply can't contribute to interval math.
    pub fn date_parsed(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Which extraction strategy ultimately produced the transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Header,
    Headerless,
    LineFallback,
}

impl ParseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Headerless => "headerless",
            Self::LineFallback => "line_fallback",
        }
    }
}

impl std::fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic codes raised while parsing
///
/// Warnings are breadcrumbs for the caller-facing "why did this fail"
/// surface, never hard errors; a strategy that raises one simply hands
/// over to the next strategy in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseWarning {
    EmptyFile,
    NoHeaders,
    NoDateDescColumns,
    NoAmountColumn,
    CantDetectColumns,
    TooFewColumns,
    GenericProfileUsed,
    AllStrategiesFailed,
}

impl ParseWarning {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyFile => "empty_file",
            Self::NoHeaders => "no_headers",
            Self::NoDateDescColumns => "no_date_desc_columns",
            Self::NoAmountColumn => "no_amount_column",
            Self::CantDetectColumns => "cant_detect_columns",
            Self::TooFewColumns => "too_few_columns",
            Self::GenericProfileUsed => "generic_profile_used",
            Self::AllStrategiesFailed => "all_strategies_failed",
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of parsing one statement file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub transactions: Vec<Transaction>,
    pub bank_id: String,
    pub strategy: ParseStrategy,
    pub warnings: Vec<ParseWarning>,
}

impl ParseResult {
    /// True when every strategy was exhausted without a transaction.
    pub fn failed(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Subscription billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Convert a per-charge amount into a monthly cost.
    pub fn monthly_equivalent(&self, amount: f64) -> f64 {
        match self {
            Self::Weekly => amount * 4.33,
            Self::Monthly => amount,
            Self::Quarterly => amount / 3.0,
            Self::Yearly => amount / 12.0,
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How sure the detector is that a group is a real subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Merchant matched the known-subscription table
    Confirmed,
    /// Recurring pattern detected but merchant unrecognized or inconsistent
    Suspicious,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Suspicious => "suspicious",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-facing triage state for a detected subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Investigate,
    Keep,
    Cancel,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investigate => "investigate",
            Self::Keep => "keep",
            Self::Cancel => "cancel",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "investigate" => Ok(Self::Investigate),
            "keep" => Ok(Self::Keep),
            "cancel" => Ok(Self::Cancel),
            _ => Err(format!("Unknown subscription status: {}", s)),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected recurring charge
///
/// Everything except `status` is immutable once computed; the rendering
/// layer updates `status` through [`AuditReport::set_status`] and never
/// re-derives the monetary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    /// Mean per-charge amount
    pub amount: f64,
    pub frequency: Frequency,
    pub monthly_equivalent: f64,
    pub yearly_equivalent: f64,
    pub occurrences: usize,
    pub first_charge: String,
    pub last_charge: String,
    pub status: SubscriptionStatus,
    pub confidence: Confidence,
    pub source_transactions: Vec<Transaction>,
}

/// Inclusive date range covered by a set of transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

/// The subscription audit produced from one upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub subscriptions: Vec<Subscription>,
    pub total_monthly: f64,
    pub total_yearly: f64,
    pub analyzed_transaction_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl AuditReport {
    /// Assemble a report from a subscription list.
    ///
    /// Sorts descending by monthly equivalent and derives the totals from
    /// the members' equivalents; the sums, not a recomputation from
    /// transactions, are the source of truth.
    pub fn from_subscriptions(
        mut subscriptions: Vec<Subscription>,
        analyzed_transaction_count: usize,
        date_range: Option<DateRange>,
    ) -> Self {
        subscriptions.sort_by(|a, b| {
            b.monthly_equivalent
                .partial_cmp(&a.monthly_equivalent)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        let round2 = |v: f64| (v * 100.0).round() / 100.0;
        let total_monthly = round2(subscriptions.iter().map(|s| s.monthly_equivalent).sum());
        let total_yearly = round2(subscriptions.iter().map(|s| s.yearly_equivalent).sum());

        Self {
            subscriptions,
            total_monthly,
            total_yearly,
            analyzed_transaction_count,
            date_range,
        }
    }

    /// Update the triage status of one subscription.
    ///
    /// This is the only mutation the rendering layer may perform.
    /// Returns false when no subscription carries the id.
    pub fn set_status(&mut self, id: &str, status: SubscriptionStatus) -> bool {
        match self.subscriptions.iter_mut().find(|s| s.id == id) {
            Some(sub) => {
                sub.status = status;
                true
            }
            None => false,
        }
    }
}

/// Per-category slice of the spending breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpend {
    pub name: String,
    pub total: f64,
    pub percent: f64,
    pub monthly_average: f64,
    pub transaction_count: usize,
    /// Up to three merchants by total spend
    pub top_merchants: Vec<MerchantSpend>,
}

/// One merchant inside a category's top list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantSpend {
    pub name: String,
    pub total: f64,
}

/// Spending bucketed across all transactions, independent of the audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingBreakdown {
    pub total_spend: f64,
    pub monthly_average: f64,
    pub categories: Vec<CategorySpend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Approximate month count derived from the date span
    pub months: f64,
    /// Natural-language observations; presentation hints only
    pub takeaways: Vec<String>,
}
