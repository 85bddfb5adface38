//! Known-subscription merchant table
//!
//! An ordered keyword → canonical-name table matched first-match-wins
//! against lowercased descriptions. Order is part of the behavior: more
//! specific keys sit above more general ones ("stc play" before "stc tv",
//! "apple.com/bill" before any bare "apple" key could). Do not alphabetize.
//!
//! The table is immutable configuration built once and injected, so tests
//! can substitute locale-specific tables.

use std::collections::HashSet;

/// Words that carry no merchant identity in a bank description.
const NOISE_WORDS: [&str; 16] = [
    "payment",
    "purchase",
    "pos",
    "recurring",
    "subscription",
    "online",
    "intl",
    "international",
    "card",
    "visa",
    "mada",
    "مشتريات",
    "شراء",
    "دفع",
    "اشتراك",
    "عملية",
];

/// One keyword → canonical-name mapping
#[derive(Debug, Clone)]
pub struct MerchantRule {
    pub keyword: String,
    pub canonical: String,
}

/// The ordered known-subscription table plus the definite-service set
#[derive(Debug, Clone)]
pub struct MerchantTable {
    rules: Vec<MerchantRule>,
    definite: HashSet<String>,
}

impl MerchantTable {
    /// Built-in table covering the streaming/music/software services seen
    /// in Saudi statements, English and Arabic spellings both.
    pub fn builtin() -> Self {
        let pairs: &[(&str, &str)] = &[
            ("apple.com/bill", "Apple Services"),
            ("itunes.com", "Apple Services"),
            ("itunes", "Apple Services"),
            ("netflix", "Netflix"),
            ("نتفلكس", "Netflix"),
            ("spotify", "Spotify"),
            ("سبوتيفاي", "Spotify"),
            ("shahid", "Shahid VIP"),
            ("شاهد", "Shahid VIP"),
            ("anghami", "Anghami"),
            ("أنغامي", "Anghami"),
            ("انغامي", "Anghami"),
            ("osn+", "OSN+"),
            ("osn", "OSN+"),
            ("stc play", "STC Play"),
            ("stc tv", "STC TV"),
            ("jawwy", "Jawwy TV"),
            ("starzplay", "STARZPLAY"),
            ("starz play", "STARZPLAY"),
            ("youtube premium", "YouTube Premium"),
            ("google youtube", "YouTube Premium"),
            ("disney", "Disney+"),
            ("ديزني", "Disney+"),
            ("amazon prime", "Amazon Prime"),
            ("prime video", "Amazon Prime"),
            ("برايم فيديو", "Amazon Prime"),
            ("icloud", "iCloud+"),
            ("google one", "Google One"),
            ("google storage", "Google One"),
            ("playstation", "PlayStation Plus"),
            ("بلايستيشن", "PlayStation Plus"),
            ("xbox game pass", "Xbox Game Pass"),
            ("xbox", "Xbox Game Pass"),
            ("microsoft 365", "Microsoft 365"),
            ("office 365", "Microsoft 365"),
            ("adobe", "Adobe Creative Cloud"),
            ("dropbox", "Dropbox"),
            ("linkedin", "LinkedIn Premium"),
            ("chatgpt", "ChatGPT Plus"),
            ("openai", "ChatGPT Plus"),
            ("duolingo", "Duolingo"),
            ("twitch", "Twitch"),
            ("fitness time", "Fitness Time"),
            ("وقت اللياقة", "Fitness Time"),
        ];

        let rules = pairs
            .iter()
            .map(|(keyword, canonical)| MerchantRule {
                keyword: keyword.to_string(),
                canonical: canonical.to_string(),
            })
            .collect::<Vec<_>>();

        // Every canonical name in the builtin table is a definite
        // subscription service
        let definite = rules.iter().map(|r| r.canonical.clone()).collect();

        Self { rules, definite }
    }

    /// Build a custom table; rule order encodes match precedence.
    pub fn new(rules: Vec<MerchantRule>, definite: HashSet<String>) -> Self {
        Self { rules, definite }
    }

    /// First-match-wins linear scan against the lowercased description.
    pub fn classify(&self, description: &str) -> Option<&str> {
        let haystack = description.to_lowercase();
        self.rules
            .iter()
            .find(|rule| haystack.contains(rule.keyword.as_str()))
            .map(|rule| rule.canonical.as_str())
    }

    /// Is this canonical name a definite subscription service?
    pub fn is_definite(&self, canonical: &str) -> bool {
        self.definite.contains(canonical)
    }
}

impl Default for MerchantTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Reduce a free-text description to a grouping key.
///
/// Lowercased, punctuation flattened to spaces, noise words and long
/// digit runs dropped. Used only for grouping, never shown to users.
pub fn merchant_key(description: &str) -> String {
    let lowered = description.to_lowercase();
    let flattened: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    flattened
        .split_whitespace()
        .filter(|word| !NOISE_WORDS.contains(word))
        .filter(|word| {
            // Long digit runs are card/terminal ids, not identity
            !(word.len() >= 3 && word.chars().all(|c| c.is_ascii_digit()))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_english() {
        let table = MerchantTable::builtin();
        assert_eq!(table.classify("NETFLIX.COM AMSTERDAM"), Some("Netflix"));
        assert_eq!(table.classify("POS SPOTIFY AB STOCKHOLM"), Some("Spotify"));
        assert_eq!(table.classify("LOCAL COFFEE SHOP"), None);
    }

    #[test]
    fn test_classify_arabic() {
        let table = MerchantTable::builtin();
        assert_eq!(table.classify("اشتراك شاهد الشهري"), Some("Shahid VIP"));
        assert_eq!(table.classify("انغامي بلس"), Some("Anghami"));
    }

    #[test]
    fn test_order_encodes_precedence() {
        let table = MerchantTable::builtin();
        // "stc play" sits above "stc tv"; a description holding both
        // phrases resolves to the earlier row
        assert_eq!(table.classify("STC PLAY STC TV BUNDLE"), Some("STC Play"));
        assert_eq!(table.classify("STC TV MONTHLY"), Some("STC TV"));
        assert_eq!(
            table.classify("APPLE.COM/BILL ITUNES"),
            Some("Apple Services")
        );
    }

    #[test]
    fn test_definite_services() {
        let table = MerchantTable::builtin();
        assert!(table.is_definite("Netflix"));
        assert!(!table.is_definite("Corner Bakery"));
    }

    #[test]
    fn test_merchant_key_strips_noise() {
        assert_eq!(
            merchant_key("POS PURCHASE NETFLIX.COM 4829103847"),
            "netflix com"
        );
        assert_eq!(merchant_key("ARAMCO محطة وقود"), "aramco محطة وقود");
        assert_eq!(merchant_key("Recurring Payment HUNGERSTATION*12"), "hungerstation 12");
    }

    #[test]
    fn test_custom_table_injection() {
        let rules = vec![MerchantRule {
            keyword: "gym".into(),
            canonical: "Local Gym".into(),
        }];
        let mut definite = HashSet::new();
        definite.insert("Local Gym".to_string());
        let table = MerchantTable::new(rules, definite);
        assert_eq!(table.classify("GYM MEMBERSHIP"), Some("Local Gym"));
        assert_eq!(table.classify("NETFLIX.COM"), None);
    }
}
