//! Bank profile registry
//!
//! Static per-bank hints for locating the date/description/amount columns
//! in a CSV export, plus the name keywords used for bank auto-detection.
//! Profiles are immutable configuration built once and injected into the
//! extraction pipeline; nothing here is mutated at runtime.

use serde::{Deserialize, Serialize};

/// Lines scanned for bank-name keywords during auto-detection.
pub const DETECT_SCAN_LINES: usize = 15;

/// Column-name hints and dialect quirks for one bank's exports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankProfile {
    pub id: String,
    /// Lowercased substrings that identify this bank in statement text
    pub name_keywords: Vec<String>,
    pub date_columns: Vec<String>,
    pub description_columns: Vec<String>,
    pub amount_columns: Vec<String>,
    pub debit_columns: Vec<String>,
    pub credit_columns: Vec<String>,
    pub reference_columns: Vec<String>,
    pub preferred_delimiter: char,
}

impl BankProfile {
    fn new(id: &str, preferred_delimiter: char) -> Self {
        Self {
            id: id.to_string(),
            name_keywords: Vec::new(),
            date_columns: Vec::new(),
            description_columns: Vec::new(),
            amount_columns: Vec::new(),
            debit_columns: Vec::new(),
            credit_columns: Vec::new(),
            reference_columns: Vec::new(),
            preferred_delimiter,
        }
    }

    fn keywords(mut self, words: &[&str]) -> Self {
        self.name_keywords = words.iter().map(|s| s.to_string()).collect();
        self
    }

    fn date(mut self, names: &[&str]) -> Self {
        self.date_columns = names.iter().map(|s| s.to_string()).collect();
        self
    }

    fn description(mut self, names: &[&str]) -> Self {
        self.description_columns = names.iter().map(|s| s.to_string()).collect();
        self
    }

    fn amount(mut self, names: &[&str]) -> Self {
        self.amount_columns = names.iter().map(|s| s.to_string()).collect();
        self
    }

    fn debit(mut self, names: &[&str]) -> Self {
        self.debit_columns = names.iter().map(|s| s.to_string()).collect();
        self
    }

    fn credit(mut self, names: &[&str]) -> Self {
        self.credit_columns = names.iter().map(|s| s.to_string()).collect();
        self
    }

    fn reference(mut self, names: &[&str]) -> Self {
        self.reference_columns = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// The set of known bank profiles plus the generic `other` catch-all
#[derive(Debug, Clone)]
pub struct BankRegistry {
    profiles: Vec<BankProfile>,
}

impl BankRegistry {
    /// Built-in profiles for the bank dialects seen in the wild.
    ///
    /// The `other` profile carries the union of every candidate list and is
    /// both the catch-all detection default and the strategy-3 fallback.
    pub fn builtin() -> Self {
        let profiles = vec![
            BankProfile::new("alrajhi", ',')
                .keywords(&["al rajhi", "alrajhi", "الراجحي"])
                .date(&["date", "transaction date", "التاريخ", "تاريخ العملية"])
                .description(&["description", "details", "البيان", "التفاصيل"])
                .amount(&["amount", "المبلغ"])
                .debit(&["debit", "مدين"])
                .credit(&["credit", "دائن"]),
            BankProfile::new("snb", ',')
                .keywords(&["saudi national bank", "alahli", "al ahli", "snb", "الأهلي", "الاهلي"])
                .date(&["date", "value date", "transaction date", "التاريخ", "تاريخ الاستحقاق"])
                .description(&["description", "narrative", "البيان", "الوصف"])
                .amount(&["amount", "المبلغ"])
                .debit(&["debit", "debit amount", "مدين", "خصم"])
                .credit(&["credit", "credit amount", "دائن", "إيداع"]),
            BankProfile::new("riyad", ';')
                .keywords(&["riyad bank", "riyadbank", "بنك الرياض"])
                .date(&["date", "posting date", "التاريخ"])
                .description(&["description", "transaction details", "تفاصيل العملية", "البيان"])
                .amount(&["amount", "المبلغ"])
                .debit(&["debit", "withdrawal", "مدين", "سحب"])
                .credit(&["credit", "deposit", "دائن", "إيداع"]),
            BankProfile::new("alinma", ',')
                .keywords(&["alinma", "الإنماء", "الانماء"])
                .date(&["date", "transaction date", "التاريخ"])
                .description(&["description", "details", "البيان"])
                .amount(&["amount", "المبلغ"])
                .debit(&["debit", "مدين"])
                .credit(&["credit", "دائن"]),
            BankProfile::new("sabb", ',')
                .keywords(&["sabb", "saudi awwal", "ساب", "الأول"])
                .date(&["date", "post date", "التاريخ"])
                .description(&["description", "narrative", "البيان"])
                .amount(&["amount", "المبلغ"])
                .debit(&["debit", "مدين"])
                .credit(&["credit", "دائن"]),
            // Catch-all: broadest candidate lists, comma preferred
            BankProfile::new("other", ',')
                .date(&[
                    "date",
                    "transaction date",
                    "value date",
                    "posting date",
                    "post date",
                    "التاريخ",
                    "تاريخ العملية",
                    "تاريخ",
                ])
                .description(&[
                    "description",
                    "details",
                    "narrative",
                    "transaction details",
                    "merchant",
                    "البيان",
                    "الوصف",
                    "التفاصيل",
                    "تفاصيل العملية",
                ])
                .amount(&["amount", "transaction amount", "المبلغ", "مبلغ العملية"])
                .debit(&["debit", "debit amount", "withdrawal", "مدين", "خصم", "سحب"])
                .credit(&["credit", "credit amount", "deposit", "دائن", "إيداع"])
                .reference(&["reference", "reference number", "ref no", "المرجع", "رقم المرجع"]),
        ];
        Self { profiles }
    }

    pub fn get(&self, id: &str) -> Option<&BankProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// The generic catch-all profile. Always present in the builtin set.
    pub fn other(&self) -> &BankProfile {
        self.get("other").expect("registry always contains 'other'")
    }

    /// Profiles with real name keywords, i.e. everything except `other`.
    pub fn named_profiles(&self) -> impl Iterator<Item = &BankProfile> {
        self.profiles.iter().filter(|p| !p.name_keywords.is_empty())
    }

    /// Scan the first few lines of statement text for bank-name keywords.
    ///
    /// Returns the profile id on a hit. Callers fall back to
    /// parse-every-profile when this returns None.
    pub fn detect_by_keywords(&self, text: &str) -> Option<&str> {
        let head: String = text
            .lines()
            .take(DETECT_SCAN_LINES)
            .collect::<Vec<_>>()
            .join("\n")
            .to_lowercase();

        for profile in self.named_profiles() {
            if profile.name_keywords.iter().any(|kw| head.contains(kw.as_str())) {
                return Some(&profile.id);
            }
        }
        None
    }
}

impl Default for BankRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_other() {
        let registry = BankRegistry::builtin();
        assert_eq!(registry.other().id, "other");
        assert!(registry.get("alrajhi").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_detect_by_keywords_english() {
        let registry = BankRegistry::builtin();
        let text = "Account Statement\nAl Rajhi Bank\nDate,Description,Amount";
        assert_eq!(registry.detect_by_keywords(text), Some("alrajhi"));
    }

    #[test]
    fn test_detect_by_keywords_arabic() {
        let registry = BankRegistry::builtin();
        let text = "كشف حساب\nمصرف الراجحي\n";
        assert_eq!(registry.detect_by_keywords(text), Some("alrajhi"));
    }

    #[test]
    fn test_detect_only_scans_head() {
        let registry = BankRegistry::builtin();
        let mut text = String::new();
        for _ in 0..DETECT_SCAN_LINES {
            text.push_str("filler line\n");
        }
        text.push_str("Riyad Bank\n");
        assert_eq!(registry.detect_by_keywords(&text), None);
    }

    #[test]
    fn test_detect_no_match() {
        let registry = BankRegistry::builtin();
        assert_eq!(registry.detect_by_keywords("Date,Description,Amount"), None);
    }
}
