//! Rasid Core Library
//!
//! Shared functionality for the Rasid subscription auditor:
//! - Multi-strategy statement parsing (CSV and PDF, Arabic/English)
//! - Bank profile registry and bank auto-detection
//! - Recurrence detection with confidence scoring
//! - Spending categorization for the breakdown view
//! - Remote analyzer boundary trait (the local pipeline is the fallback)
//!
//! Everything here is synchronous, in-memory computation; nothing is
//! persisted and no network is touched.

pub mod analyzer;
pub mod banks;
pub mod categorize;
pub mod detect;
pub mod error;
pub mod extract;
pub mod merchants;
pub mod models;
pub mod normalize;
pub mod pdf;
pub mod sniff;

pub use analyzer::{MockAnalyzer, StatementAnalyzer};
pub use banks::{BankProfile, BankRegistry};
pub use categorize::{breakdown, subscription_takeaway, CategoryRule, CategoryTable};
pub use detect::{AuditConfig, SubscriptionAuditor};
pub use error::{Error, Result};
pub use extract::{parse_statement, parse_text};
pub use merchants::{merchant_key, MerchantRule, MerchantTable};
pub use models::{
    AuditReport, CategorySpend, Confidence, DateRange, FileKind, Frequency, MerchantSpend,
    ParseResult, ParseStrategy, ParseWarning, SpendingBreakdown, Subscription, SubscriptionStatus,
    Transaction,
};
