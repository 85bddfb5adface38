//! PDF statement text reconstruction
//!
//! PDF text arrives as positioned fragments, not rows. The content stream
//! of each page is walked while tracking the text matrix, so every shown
//! string gets an (x, y) anchor; fragments are then bucketed by quantized
//! vertical position to rebuild visual rows, ordered left-to-right within
//! a row and top-to-bottom across the page. Reconstructed rows are joined
//! with tabs, which lets them ride the normal delimiter-inference path.
//!
//! The hand-rolled walker decodes simple (WinAnsi-style and UTF-16BE)
//! strings only; pages using CID fonts come out as noise and contribute
//! nothing. That is why every page's plain text from lopdf's own
//! `extract_text` is kept as well; the loose whole-line fallback runs on
//! it when the structured pass comes up short.

use lopdf::content::Content;
use lopdf::{Document, Object};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::Result;

/// Vertical quantization tolerance for row bucketing, in text-space units.
const ROW_TOLERANCE: f32 = 5.0;

/// Statement boilerplate that never holds a transaction.
const LINE_DENYLIST: [&str; 16] = [
    "opening balance",
    "closing balance",
    "statement of account",
    "account statement",
    "iban",
    "account number",
    "page ",
    "total balance",
    "brought forward",
    "carried forward",
    "customer name",
    "الرصيد الافتتاحي",
    "الرصيد الختامي",
    "كشف حساب",
    "رقم الحساب",
    "رقم الآيبان",
];

/// One positioned piece of shown text
#[derive(Debug, Clone)]
struct Fragment {
    x: f32,
    y: f32,
    text: String,
}

/// Reconstructed statement text for one document
#[derive(Debug, Clone)]
pub struct PdfExtraction {
    /// Visual rows rebuilt from positioned fragments, tab-separated
    pub rows: Vec<String>,
    /// Per-page plain text lines from lopdf's extractor (loose fallback)
    pub raw_lines: Vec<String>,
}

/// Decode a PDF document into reconstructed rows plus loose lines.
///
/// Pages are processed sequentially; a page whose content cannot be read
/// is skipped and extraction continues with the rest.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<PdfExtraction> {
    let doc = Document::load_mem(bytes)?;
    let pages = doc.get_pages();

    let mut rows: Vec<String> = Vec::new();
    let mut raw_lines: Vec<String> = Vec::new();

    for (page_no, page_id) in &pages {
        match page_fragments(&doc, *page_id) {
            Ok(fragments) => {
                let page_rows = reconstruct_rows(fragments);
                rows.extend(page_rows.into_iter().filter(|r| !is_boilerplate(r)));
            }
            Err(e) => {
                warn!(page = page_no, error = %e, "skipping unreadable pdf page");
            }
        }

        match doc.extract_text(&[*page_no]) {
            Ok(text) => {
                raw_lines.extend(
                    text.lines()
                        .map(|l| l.trim().to_string())
                        .filter(|l| !l.is_empty() && !is_boilerplate(l)),
                );
            }
            Err(e) => {
                warn!(page = page_no, error = %e, "lopdf text extraction failed for page");
            }
        }
    }

    debug!(
        pages = pages.len(),
        rows = rows.len(),
        raw_lines = raw_lines.len(),
        "pdf extraction complete"
    );
    Ok(PdfExtraction { rows, raw_lines })
}

/// Walk one page's content stream and collect positioned text fragments.
fn page_fragments(doc: &Document, page_id: lopdf::ObjectId) -> Result<Vec<Fragment>> {
    let content_bytes = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_bytes)?;

    let mut fragments = Vec::new();

    // Text-line origin and current position in text space. Only the
    // translation part of the matrices is tracked; statement generators
    // do not rotate text.
    let mut line_origin = (0.0f32, 0.0f32);
    let mut cursor = line_origin;
    let mut leading = 0.0f32;

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                line_origin = (0.0, 0.0);
                cursor = line_origin;
                leading = 0.0;
            }
            "Tm" => {
                if operands.len() == 6 {
                    if let (Some(x), Some(y)) = (number(&operands[4]), number(&operands[5])) {
                        line_origin = (x, y);
                        cursor = line_origin;
                    }
                }
            }
            "Td" | "TD" => {
                if operands.len() == 2 {
                    if let (Some(tx), Some(ty)) = (number(&operands[0]), number(&operands[1])) {
                        line_origin = (line_origin.0 + tx, line_origin.1 + ty);
                        cursor = line_origin;
                        if op.operator == "TD" {
                            leading = -ty;
                        }
                    }
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(number) {
                    leading = l;
                }
            }
            "T*" => {
                line_origin.1 -= leading;
                cursor = line_origin;
            }
            "Tj" => {
                if let Some(text) = operands.first().and_then(string_object) {
                    push_fragment(&mut fragments, cursor, text);
                }
            }
            "'" => {
                line_origin.1 -= leading;
                cursor = line_origin;
                if let Some(text) = operands.first().and_then(string_object) {
                    push_fragment(&mut fragments, cursor, text);
                }
            }
            "\"" => {
                line_origin.1 -= leading;
                cursor = line_origin;
                if let Some(text) = operands.get(2).and_then(string_object) {
                    push_fragment(&mut fragments, cursor, text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut combined = String::new();
                    for item in items {
                        if let Some(text) = string_object(item) {
                            combined.push_str(&text);
                        }
                    }
                    push_fragment(&mut fragments, cursor, combined);
                }
            }
            _ => {}
        }
    }

    Ok(fragments)
}

fn push_fragment(fragments: &mut Vec<Fragment>, at: (f32, f32), text: String) {
    if text.trim().is_empty() {
        return;
    }
    fragments.push(Fragment {
        x: at.0,
        y: at.1,
        text,
    });
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn string_object(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_bytes(bytes)),
        _ => None,
    }
}

/// Decode a PDF string object's bytes.
///
/// UTF-16BE when the BOM says so, byte-per-char otherwise. CID-encoded
/// strings are not resolvable here; the loose fallback covers those pages.
fn decode_text_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Group fragments into visual rows by quantized vertical position.
///
/// Fragments within one bucket are ordered left-to-right and joined with
/// tabs; buckets are emitted top-to-bottom (descending y, since PDF space has
/// its origin at the bottom of the page).
fn reconstruct_rows(fragments: Vec<Fragment>) -> Vec<String> {
    let mut buckets: BTreeMap<i64, Vec<Fragment>> = BTreeMap::new();
    for fragment in fragments {
        let key = (fragment.y / ROW_TOLERANCE).round() as i64;
        buckets.entry(key).or_default().push(fragment);
    }

    let mut rows = Vec::with_capacity(buckets.len());
    for (_, mut bucket) in buckets.into_iter().rev() {
        bucket.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let row = bucket
            .iter()
            .map(|f| f.text.trim())
            .collect::<Vec<_>>()
            .join("\t");
        if !row.trim().is_empty() {
            rows.push(row);
        }
    }
    rows
}

/// Fixed denylist for statement boilerplate rows.
fn is_boilerplate(line: &str) -> bool {
    let lower = line.to_lowercase();
    LINE_DENYLIST.iter().any(|deny| lower.contains(deny))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(x: f32, y: f32, text: &str) -> Fragment {
        Fragment {
            x,
            y,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_reconstruct_rows_orders_by_position() {
        let fragments = vec![
            frag(200.0, 700.0, "59.99"),
            frag(10.0, 700.0, "15/01/2026"),
            frag(80.0, 701.5, "NETFLIX.COM"),
            frag(10.0, 650.0, "20/01/2026"),
            frag(80.0, 650.0, "JAHEZ"),
            frag(200.0, 649.0, "82.50"),
        ];
        let rows = reconstruct_rows(fragments);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "15/01/2026\tNETFLIX.COM\t59.99");
        assert_eq!(rows[1], "20/01/2026\tJAHEZ\t82.50");
    }

    #[test]
    fn test_reconstruct_rows_tolerance_split() {
        // 10 units apart is two distinct rows at tolerance 5
        let fragments = vec![frag(0.0, 700.0, "a"), frag(0.0, 690.0, "b")];
        let rows = reconstruct_rows(fragments);
        assert_eq!(rows, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_boilerplate_denylist() {
        assert!(is_boilerplate("Opening Balance\t12,345.00"));
        assert!(is_boilerplate("IBAN: SA03 8000 0000 6080 1016 7519"));
        assert!(is_boilerplate("Page 2 of 7"));
        assert!(is_boilerplate("كشف حساب العميل"));
        assert!(!is_boilerplate("15/01/2026\tNETFLIX.COM\t59.99"));
    }

    #[test]
    fn test_decode_utf16be() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42];
        assert_eq!(decode_text_bytes(&bytes), "AB");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        assert_eq!(decode_text_bytes(b"NETFLIX"), "NETFLIX");
    }

    #[test]
    fn test_invalid_pdf_is_error() {
        assert!(extract_pdf_text(b"not a pdf at all").is_err());
    }
}
