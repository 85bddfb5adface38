//! Row extraction pipeline
//!
//! Raw statement lines go through an ordered list of increasingly
//! permissive strategies; the first one to produce a transaction wins.
//! A strict single-format parser would reject most real exports: the
//! same bank ships different column names, delimiters and languages
//! depending on channel.
//!
//! Strategy order:
//! 1. header-based with the bank's own profile and the inferred delimiter
//! 2. header-based with the bank's profile and its preferred delimiter
//! 3. header-based with the generic `other` profile
//! 4. headerless, shape-scored columns
//! 5. line-regex fallback over raw lines
//!
//! Warnings raised by abandoned strategies are kept on the final result;
//! they are the caller's diagnostics surface.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::banks::{BankProfile, BankRegistry};
use crate::error::Result;
use crate::models::{FileKind, ParseResult, ParseStrategy, ParseWarning, Transaction};
use crate::normalize::{normalize_date, parse_amount_token};
use crate::pdf;
use crate::sniff::{self, ColumnRoles};

/// Rows sampled when scoring headerless columns.
const HEADERLESS_SAMPLE_ROWS: usize = 20;

/// Structured PDF extraction below this count triggers the loose pass.
const PDF_MIN_STRUCTURED: usize = 3;

fn line_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}|\d{1,2}[ \-][A-Za-z]{3,9}[ \-]\d{2,4}",
        )
        .unwrap()
    })
}

fn line_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,3}(?:,\d{3})*\.\d{1,2}|\d+\.\d{1,2}").unwrap())
}

fn bare_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+(?:[.,]\d+)?\b").unwrap())
}

/// What a single strategy produced
struct StrategyOutcome {
    transactions: Vec<Transaction>,
    warnings: Vec<ParseWarning>,
}

impl StrategyOutcome {
    fn empty(warning: ParseWarning) -> Self {
        Self {
            transactions: Vec::new(),
            warnings: vec![warning],
        }
    }
}

/// Parse one statement file into a transaction ledger.
///
/// `bank_hint` short-circuits bank detection; otherwise the first lines
/// are scanned for bank-name keywords, and failing that every known
/// profile is tried and the best yield wins.
pub fn parse_statement(
    bytes: &[u8],
    kind: FileKind,
    bank_hint: Option<&str>,
    registry: &BankRegistry,
) -> Result<ParseResult> {
    match kind {
        FileKind::Csv => {
            let text = String::from_utf8_lossy(bytes);
            Ok(parse_text(&text, bank_hint, registry))
        }
        FileKind::Pdf => parse_pdf(bytes, bank_hint, registry),
    }
}

/// Parse statement text (CSV content or reconstructed PDF rows).
pub fn parse_text(text: &str, bank_hint: Option<&str>, registry: &BankRegistry) -> ParseResult {
    let lines: Vec<&str> = text.lines().collect();

    if let Some(id) = bank_hint {
        let profile = registry.get(id).unwrap_or_else(|| registry.other());
        return run_pipeline(&lines, profile, registry);
    }

    if let Some(id) = registry.detect_by_keywords(text) {
        let profile = registry.get(id).unwrap_or_else(|| registry.other());
        return run_pipeline(&lines, profile, registry);
    }

    // No keyword hit: try every named profile and keep the best yield
    let mut best: Option<ParseResult> = None;
    for profile in registry.named_profiles() {
        let result = run_pipeline(&lines, profile, registry);
        let better = best
            .as_ref()
            .map(|b| result.transactions.len() > b.transactions.len())
            .unwrap_or(true);
        if better {
            best = Some(result);
        }
    }

    match best {
        Some(result) if !result.transactions.is_empty() => result,
        _ => run_pipeline(&lines, registry.other(), registry),
    }
}

/// PDF path: reconstruct rows from positioned fragments, run the normal
/// pipeline, and when the structured attempt stays under
/// [`PDF_MIN_STRUCTURED`] transactions also try the loose whole-line
/// extractor; the larger result wins.
fn parse_pdf(bytes: &[u8], bank_hint: Option<&str>, registry: &BankRegistry) -> Result<ParseResult> {
    let extraction = pdf::extract_pdf_text(bytes)?;

    let rows_text = extraction.rows.join("\n");
    let structured = parse_text(&rows_text, bank_hint, registry);
    if structured.transactions.len() >= PDF_MIN_STRUCTURED {
        return Ok(structured);
    }

    let loose_lines: Vec<&str> = extraction.raw_lines.iter().map(|s| s.as_str()).collect();
    let loose = line_fallback(&loose_lines);
    debug!(
        structured = structured.transactions.len(),
        loose = loose.transactions.len(),
        "pdf loose fallback comparison"
    );

    if loose.transactions.len() > structured.transactions.len() {
        let mut warnings = structured.warnings;
        for w in loose.warnings {
            if !warnings.contains(&w) {
                warnings.push(w);
            }
        }
        return Ok(ParseResult {
            transactions: loose.transactions,
            bank_id: structured.bank_id,
            strategy: ParseStrategy::LineFallback,
            warnings,
        });
    }
    Ok(structured)
}

/// Run the ordered strategy list for one bank profile.
fn run_pipeline(lines: &[&str], profile: &BankProfile, registry: &BankRegistry) -> ParseResult {
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let push_warnings = |warnings: &mut Vec<ParseWarning>, extra: &[ParseWarning]| {
        for w in extra {
            if !warnings.contains(w) {
                warnings.push(*w);
            }
        }
    };

    if lines.iter().all(|l| l.trim().is_empty()) {
        return ParseResult {
            transactions: Vec::new(),
            bank_id: profile.id.clone(),
            strategy: ParseStrategy::Header,
            warnings: vec![ParseWarning::EmptyFile, ParseWarning::AllStrategiesFailed],
        };
    }

    let inferred = sniff::detect_delimiter(lines);

    // 1. own profile, inferred delimiter
    let outcome = header_based(lines, inferred, profile);
    push_warnings(&mut warnings, &outcome.warnings);
    if !outcome.transactions.is_empty() {
        debug!(bank = %profile.id, delimiter = ?inferred, "header strategy succeeded");
        return ParseResult {
            transactions: outcome.transactions,
            bank_id: profile.id.clone(),
            strategy: ParseStrategy::Header,
            warnings,
        };
    }

    // 2. own profile, preferred delimiter (inference may have picked wrong)
    if profile.preferred_delimiter != inferred {
        let outcome = header_based(lines, profile.preferred_delimiter, profile);
        push_warnings(&mut warnings, &outcome.warnings);
        if !outcome.transactions.is_empty() {
            debug!(bank = %profile.id, "header strategy succeeded with preferred delimiter");
            return ParseResult {
                transactions: outcome.transactions,
                bank_id: profile.id.clone(),
                strategy: ParseStrategy::Header,
                warnings,
            };
        }
    }

    // 3. generic profile: broadest column-name candidates
    if profile.id != registry.other().id {
        let outcome = header_based(lines, inferred, registry.other());
        push_warnings(&mut warnings, &outcome.warnings);
        if !outcome.transactions.is_empty() {
            debug!(bank = %profile.id, "generic profile strategy succeeded");
            push_warnings(&mut warnings, &[ParseWarning::GenericProfileUsed]);
            return ParseResult {
                transactions: outcome.transactions,
                bank_id: registry.other().id.clone(),
                strategy: ParseStrategy::Header,
                warnings,
            };
        }
    }

    // 4. headerless, shape-scored columns
    let outcome = headerless(lines, inferred, registry);
    push_warnings(&mut warnings, &outcome.warnings);
    if !outcome.transactions.is_empty() {
        debug!(bank = %profile.id, "headerless strategy succeeded");
        return ParseResult {
            transactions: outcome.transactions,
            bank_id: profile.id.clone(),
            strategy: ParseStrategy::Headerless,
            warnings,
        };
    }

    // 5. line-regex fallback
    let outcome = line_fallback(lines);
    push_warnings(&mut warnings, &outcome.warnings);
    if !outcome.transactions.is_empty() {
        debug!(bank = %profile.id, "line fallback strategy succeeded");
        return ParseResult {
            transactions: outcome.transactions,
            bank_id: profile.id.clone(),
            strategy: ParseStrategy::LineFallback,
            warnings,
        };
    }

    push_warnings(&mut warnings, &[ParseWarning::AllStrategiesFailed]);
    ParseResult {
        transactions: Vec::new(),
        bank_id: profile.id.clone(),
        strategy: ParseStrategy::LineFallback,
        warnings,
    }
}

/// Header-based extraction with one profile and one delimiter.
fn header_based(lines: &[&str], delimiter: char, profile: &BankProfile) -> StrategyOutcome {
    let Some((header_idx, roles)) = sniff::find_header_row(lines, delimiter, profile) else {
        // Distinguish "no header at all" from "header there, roles missing"
        let warning = if any_known_label(lines, delimiter, profile) {
            ParseWarning::NoDateDescColumns
        } else {
            ParseWarning::NoHeaders
        };
        return StrategyOutcome::empty(warning);
    };

    if !roles.has_amount_source() {
        return StrategyOutcome::empty(ParseWarning::NoAmountColumn);
    }

    let body: Vec<&str> = lines[header_idx + 1..].to_vec();
    let transactions = extract_rows(&body, delimiter, &roles);
    StrategyOutcome {
        transactions,
        warnings: Vec::new(),
    }
}

/// Does any cell in the scan window match a known column label exactly?
fn any_known_label(lines: &[&str], delimiter: char, profile: &BankProfile) -> bool {
    let candidates: Vec<String> = profile
        .date_columns
        .iter()
        .chain(&profile.description_columns)
        .chain(&profile.amount_columns)
        .chain(&profile.debit_columns)
        .chain(&profile.credit_columns)
        .map(|s| s.to_lowercase())
        .collect();

    lines.iter().take(sniff::HEADER_SCAN_LINES).any(|line| {
        sniff::split_line(line, delimiter)
            .iter()
            .any(|cell| candidates.contains(&cell.trim().to_lowercase()))
    })
}

/// Read the data rows below a header through the csv crate.
fn extract_rows(body: &[&str], delimiter: char, roles: &ColumnRoles) -> Vec<Transaction> {
    let text = body.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(text.as_bytes());

    let mut transactions = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();

        let date_cell = cell(roles.date);
        let desc_cell = cell(roles.description);
        if date_cell.is_empty() || desc_cell.is_empty() {
            continue;
        }

        let debit_value = roles.debit.map(|i| parse_amount_token(&cell(i)));
        let credit_value = roles.credit.map(|i| parse_amount_token(&cell(i)));

        // Money coming in, not a charge
        if credit_value.unwrap_or(0.0) > 0.0 && debit_value.unwrap_or(0.0) == 0.0 {
            continue;
        }

        let amount = match debit_value {
            Some(v) if v > 0.0 => v,
            _ => roles.amount.map(|i| parse_amount_token(&cell(i))).unwrap_or(0.0),
        };
        if amount == 0.0 {
            continue;
        }

        let reference = roles
            .reference
            .map(|i| cell(i))
            .filter(|r| !r.is_empty());

        transactions.push(Transaction {
            date: normalize_date(&date_cell),
            description: desc_cell,
            amount,
            reference,
        });
    }
    transactions
}

/// Headerless extraction: infer column roles from value shapes.
fn headerless(lines: &[&str], delimiter: char, registry: &BankRegistry) -> StrategyOutcome {
    let data_lines: Vec<&str> = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .copied()
        .collect();
    if data_lines.is_empty() {
        return StrategyOutcome::empty(ParseWarning::EmptyFile);
    }

    let text = data_lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(text.as_bytes());

    let records: Vec<csv::StringRecord> = reader.records().filter_map(|r| r.ok()).collect();
    if records.is_empty() {
        return StrategyOutcome::empty(ParseWarning::EmptyFile);
    }

    let width = records.iter().map(|r| r.len()).max().unwrap_or(0);
    if width < 3 {
        return StrategyOutcome::empty(ParseWarning::TooFewColumns);
    }

    // Score every column over a sample of rows
    let sample: Vec<&csv::StringRecord> =
        records.iter().take(HEADERLESS_SAMPLE_ROWS).collect();
    let mut date_scores = vec![0usize; width];
    let mut amount_scores = vec![0usize; width];
    let mut text_scores = vec![0usize; width];
    for record in &sample {
        for col in 0..width {
            let value = record.get(col).unwrap_or("").trim();
            if value.is_empty() {
                continue;
            }
            if crate::normalize::looks_like_date(value) {
                date_scores[col] += 1;
            } else if crate::normalize::looks_like_amount(value) {
                amount_scores[col] += 1;
            } else {
                text_scores[col] += 1;
            }
        }
    }

    let date_col = match max_index(&date_scores, &[]) {
        Some(col) if date_scores[col] > 0 => col,
        _ => return StrategyOutcome::empty(ParseWarning::CantDetectColumns),
    };
    let amount_col = match max_index(&amount_scores, &[date_col]) {
        Some(col) if amount_scores[col] > 0 => col,
        _ => return StrategyOutcome::empty(ParseWarning::CantDetectColumns),
    };

    let sample_len = sample.len();
    let desc_col = (0..width).find(|&col| {
        col != date_col
            && col != amount_col
            && text_scores[col] > 0
            && date_scores[col] <= sample_len / 5
            && amount_scores[col] <= sample_len / 5
    });
    let Some(desc_col) = desc_col else {
        return StrategyOutcome::empty(ParseWarning::CantDetectColumns);
    };

    // Residual header rows: date/description cells that are really labels
    let labels: Vec<String> = {
        let other = registry.other();
        other
            .date_columns
            .iter()
            .chain(&other.description_columns)
            .chain(&other.amount_columns)
            .map(|s| s.to_lowercase())
            .collect()
    };

    let mut transactions = Vec::new();
    for record in &records {
        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let date_cell = cell(date_col);
        let desc_cell = cell(desc_col);
        if date_cell.is_empty() || desc_cell.is_empty() {
            continue;
        }
        if labels.contains(&date_cell.to_lowercase()) || labels.contains(&desc_cell.to_lowercase())
        {
            continue;
        }

        let amount = parse_amount_token(&cell(amount_col));
        if amount == 0.0 {
            continue;
        }

        transactions.push(Transaction {
            date: normalize_date(&date_cell),
            description: desc_cell,
            amount,
            reference: None,
        });
    }

    StrategyOutcome {
        transactions,
        warnings: Vec::new(),
    }
}

fn max_index(scores: &[usize], excluded: &[usize]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(i, _)| !excluded.contains(i))
        .max_by_key(|(_, &score)| score)
        .map(|(i, _)| i)
}

/// Last-resort extraction: any line holding both a date-shaped and a
/// decimal-amount-shaped substring becomes a transaction; the description
/// is whatever survives stripping those plus delimiters and bare numbers.
fn line_fallback(lines: &[&str]) -> StrategyOutcome {
    let mut transactions = Vec::new();

    for raw in lines {
        let line = crate::normalize::fold_digits(raw.trim());
        if line.is_empty() {
            continue;
        }

        let Some(date_match) = line_date_re().find(&line) else {
            continue;
        };
        // Rightmost decimal token that is outside the date span
        let amount_match = line_amount_re()
            .find_iter(&line)
            .filter(|m| m.start() >= date_match.end() || m.end() <= date_match.start())
            .last();
        let Some(amount_match) = amount_match else {
            continue;
        };

        let amount = parse_amount_token(amount_match.as_str());
        if amount == 0.0 {
            continue;
        }

        let mut remainder = String::with_capacity(line.len());
        for (i, c) in line.char_indices() {
            let in_date = i >= date_match.start() && i < date_match.end();
            let in_amount = i >= amount_match.start() && i < amount_match.end();
            if in_date || in_amount {
                continue;
            }
            remainder.push(c);
        }
        let remainder = remainder.replace([',', ';', '|', '\t'], " ");
        let remainder = bare_number_re().replace_all(&remainder, " ");
        let description = remainder.split_whitespace().collect::<Vec<_>>().join(" ");
        if description.is_empty() {
            continue;
        }

        transactions.push(Transaction {
            date: normalize_date(date_match.as_str()),
            description,
            amount,
            reference: None,
        });
    }

    StrategyOutcome {
        transactions,
        warnings: Vec::new(),
    }
}
