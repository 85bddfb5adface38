//! Locale-aware token cleanup
//!
//! Every downstream component runs on text that has been through
//! [`fold_digits`] first: Arabic-Indic digits become ASCII so a single set
//! of patterns covers both scripts. Date and amount parsing are the
//! authoritative conversions; the `looks_like_*` classifiers are cheap
//! shape checks used only while inferring column roles.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Two-digit years below this resolve to 2000s, the rest to 1900s.
const YEAR_PIVOT: u32 = 50;

/// Three-letter month abbreviations for named-month date forms.
const MONTH_ABBREVS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Currency markers stripped before amount shape checks.
const CURRENCY_MARKERS: [&str; 8] = ["sar", "sr", "aed", "usd", "ر.س", "ريال", "﷼", "$"];

fn numeric_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,4}[/\-.]\d{1,2}[/\-.]\d{1,4}$").unwrap())
}

fn named_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[ \-]([A-Za-z]{3,9})[ \-,]+(\d{2,4})$").unwrap())
}

fn two_digit_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})([/\-.])(\d{1,2})([/\-.])(\d{2})$").unwrap())
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+\-]?\d{1,3}(?:,\d{3})*(?:\.\d+)?$|^[+\-]?\d+(?:[.,]\d+)?$").unwrap()
    })
}

/// Convert Arabic-Indic digits (and Arabic numeric separators) to their
/// ASCII equivalents. Everything else passes through untouched.
pub fn fold_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            // Arabic-Indic ٠..٩
            '\u{0660}'..='\u{0669}' => {
                char::from_u32('0' as u32 + (c as u32 - 0x0660)).unwrap_or(c)
            }
            // Eastern Arabic-Indic ۰..۹ (Persian/Urdu forms seen in some exports)
            '\u{06F0}'..='\u{06F9}' => {
                char::from_u32('0' as u32 + (c as u32 - 0x06F0)).unwrap_or(c)
            }
            // Arabic decimal and thousands separators
            '\u{066B}' => '.',
            '\u{066C}' => ',',
            _ => c,
        })
        .collect()
}

/// Parse a date token in the formats banks actually export.
///
/// Tried in order: ISO (`YYYY-MM-DD`, `YYYY/MM/DD`), day-first
/// (`DD/MM/YYYY`, `DD-MM-YYYY`), two-digit-year day-first (pivot 50),
/// then named-month forms (`15 Jan 2026`, `15-Jan-26`).
pub fn parse_date_token(raw: &str) -> Option<NaiveDate> {
    let s = fold_digits(raw.trim());
    if s.is_empty() {
        return None;
    }

    // Two-digit year first: chrono's %Y happily parses "26" as year 26,
    // and its %y pivots at 69 where the pivot here is 50
    if let Some(caps) = two_digit_year_re().captures(&s) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[3].parse().ok()?;
        let yy: u32 = caps[5].parse().ok()?;
        let year = expand_year(yy);
        return NaiveDate::from_ymd_opt(year as i32, month, day);
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(date);
        }
    }

    // Named month: "15 Jan 2026", "15-Jan-26", "01 September 2025"
    if let Some(caps) = named_date_re().captures(&s) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_name(&caps[2])?;
        let year_raw: u32 = caps[3].parse().ok()?;
        let year = if caps[3].len() == 2 {
            expand_year(year_raw)
        } else {
            year_raw
        };
        return NaiveDate::from_ymd_opt(year as i32, month, day);
    }

    None
}

/// Normalize a date token to ISO `YYYY-MM-DD`.
///
/// Unrecognized formats come back unmodified; callers treat a
/// non-ISO result as a weak signal rather than an error.
pub fn normalize_date(raw: &str) -> String {
    match parse_date_token(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.trim().to_string(),
    }
}

fn expand_year(yy: u32) -> u32 {
    if yy < YEAR_PIVOT {
        2000 + yy
    } else {
        1900 + yy
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let key = if lower.len() >= 3 { &lower[..3] } else { return None };
    MONTH_ABBREVS
        .iter()
        .position(|m| *m == key)
        .map(|i| i as u32 + 1)
}

/// Parse an amount token into a non-negative decimal.
///
/// Strips currency symbols and grouping separators, resolves the
/// European `1.234,56` shape by treating the last separator as decimal,
/// and takes the absolute value. Anything non-numeric becomes `0.0`,
/// which extraction treats as "no transaction".
pub fn parse_amount_token(raw: &str) -> f64 {
    let folded = fold_digits(raw.trim());
    let kept: String = folded
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if kept.is_empty() {
        return 0.0;
    }

    let last_dot = kept.rfind('.');
    let last_comma = kept.rfind(',');
    let cleaned = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            // Both present: the rightmost one is the decimal separator
            if d > c {
                kept.replace(',', "")
            } else {
                kept.replace('.', "").replace(',', ".")
            }
        }
        (None, Some(_)) => {
            // Comma only: decimal when it introduces a 1-2 digit tail,
            // thousands grouping otherwise
            let tail_len = kept.len() - kept.rfind(',').unwrap() - 1;
            if kept.matches(',').count() == 1 && (1..=2).contains(&tail_len) {
                kept.replace(',', ".")
            } else {
                kept.replace(',', "")
            }
        }
        _ => kept,
    };

    cleaned.parse::<f64>().map(f64::abs).unwrap_or(0.0)
}

/// Shape check: does this cell plausibly hold a date?
///
/// Heuristic only; [`parse_date_token`] is the authoritative parse.
pub fn looks_like_date(raw: &str) -> bool {
    let s = fold_digits(raw.trim());
    if s.is_empty() {
        return false;
    }
    numeric_date_re().is_match(&s) || named_date_re().is_match(&s)
}

/// Shape check: does this cell plausibly hold a monetary amount?
pub fn looks_like_amount(raw: &str) -> bool {
    let folded = fold_digits(raw.trim());
    let mut s = folded.to_lowercase();
    for marker in CURRENCY_MARKERS {
        s = s.replace(marker, "");
    }
    let s = s.trim();
    !s.is_empty() && amount_re().is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_digits() {
        assert_eq!(fold_digits("٢٠٢٦-٠١-١٥"), "2026-01-15");
        assert_eq!(fold_digits("۱۲۳"), "123");
        assert_eq!(fold_digits("١٬٢٣٤٫٥٦"), "1,234.56");
        assert_eq!(fold_digits("no digits"), "no digits");
    }

    #[test]
    fn test_normalize_arabic_date() {
        assert_eq!(normalize_date("٢٠٢٦-٠١-١٥"), "2026-01-15");
    }

    #[test]
    fn test_parse_date_formats() {
        let expect = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(parse_date_token("2026-01-15"), Some(expect));
        assert_eq!(parse_date_token("2026/01/15"), Some(expect));
        assert_eq!(parse_date_token("15/01/2026"), Some(expect));
        assert_eq!(parse_date_token("15-01-2026"), Some(expect));
        assert_eq!(parse_date_token("15 Jan 2026"), Some(expect));
        assert_eq!(parse_date_token("15-Jan-26"), Some(expect));
        assert_eq!(parse_date_token("15 January 2026"), Some(expect));
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(
            parse_date_token("15/01/26"),
            NaiveDate::from_ymd_opt(2026, 1, 15)
        );
        assert_eq!(
            parse_date_token("15/01/49"),
            NaiveDate::from_ymd_opt(2049, 1, 15)
        );
        assert_eq!(
            parse_date_token("15/01/50"),
            NaiveDate::from_ymd_opt(1950, 1, 15)
        );
        assert_eq!(
            parse_date_token("15/01/99"),
            NaiveDate::from_ymd_opt(1999, 1, 15)
        );
    }

    #[test]
    fn test_unrecognized_date_passes_through() {
        assert_eq!(normalize_date("mid January"), "mid January");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount_token("1,234.56"), 1234.56);
        assert_eq!(parse_amount_token("-59.99"), 59.99);
        assert_eq!(parse_amount_token("SAR 120.00"), 120.0);
        assert_eq!(parse_amount_token("1.234,56"), 1234.56);
        assert_eq!(parse_amount_token("٥٩٫٩٩"), 59.99);
        assert_eq!(parse_amount_token("1,250"), 1250.0);
        assert_eq!(parse_amount_token("12,5"), 12.5);
        assert_eq!(parse_amount_token("n/a"), 0.0);
        assert_eq!(parse_amount_token(""), 0.0);
    }

    #[test]
    fn test_looks_like_date() {
        assert!(looks_like_date("2026-01-15"));
        assert!(looks_like_date("15/01/26"));
        assert!(looks_like_date("١٥/٠١/٢٠٢٦"));
        assert!(looks_like_date("15-Jan-26"));
        assert!(!looks_like_date("NETFLIX.COM"));
        assert!(!looks_like_date("59.99"));
    }

    #[test]
    fn test_looks_like_amount() {
        assert!(looks_like_amount("59.99"));
        assert!(looks_like_amount("-1,234.56"));
        assert!(looks_like_amount("SAR 120"));
        assert!(looks_like_amount("٥٩٫٩٩"));
        assert!(!looks_like_amount("NETFLIX.COM"));
        assert!(!looks_like_amount("15/01/2026"));
        assert!(!looks_like_amount(""));
    }
}
