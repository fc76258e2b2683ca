//! Citation cleanup.
//!
//! Raw citations arrive with trailing catalog noise: archive notes and
//! retrieval dates after the ISBN, page references, an embedded "(PDF)"
//! marker inside the title. Cleanup normalizes the string for display only;
//! classification and parsing always receive the original text.

use regex::Regex;
use std::sync::OnceLock;

fn pdf_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(PDF\)").unwrap())
}

fn isbn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bISBN[:\s]*[0-9][0-9Xx-]*[0-9Xx]").unwrap())
}

fn page_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\bpp?\.\s*[0-9][0-9,\s\u{2013}\u{2014}-]*\.?").unwrap())
}

/// Normalize a citation string for display.
///
/// Drops the "(PDF)" marker, truncates everything after the ISBN number, and
/// strips trailing `p.`/`pp.` page references.
pub fn clean_citation(citation: &str) -> String {
    let cleaned = pdf_marker_re().replace_all(citation, "");

    let cleaned = match isbn_re().find(&cleaned) {
        Some(m) => cleaned[..m.end()].to_string(),
        None => cleaned.into_owned(),
    };

    page_ref_re().replace_all(&cleaned, "").trim().to_string()
}
