//! Heuristic field extraction from raw citation text.
//!
//! These functions back the sort engine when no structured record exists for
//! an index yet a derived-field sort was requested. They are deliberately
//! approximate; a structured record supersedes them as soon as the parse
//! service returns one. Every function is total, so the sort comparator
//! never receives a missing value.

use regex::Regex;
use std::sync::OnceLock;

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // First run of non-period characters after a period.
    RE.get_or_init(|| Regex::new(r"\.\s*([^.]+)").unwrap())
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap())
}

/// Approximate title: the first span between periods, or the whole citation
/// when it contains no period-delimited span.
pub fn title(citation: &str) -> &str {
    title_re()
        .captures(citation)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(citation)
}

/// Approximate author: the leading span up to the first parenthesis or period.
pub fn author(citation: &str) -> &str {
    let end = citation
        .find(['(', '.'])
        .unwrap_or(citation.len());
    citation[..end].trim()
}

/// Approximate publication year: the first 19xx/20xx token, or 0.
pub fn year(citation: &str) -> u32 {
    year_re()
        .find(citation)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_after_first_period() {
        let citation =
            "Miller, Ron (2005). Stars and Galaxies. Twenty-First Century Books. ISBN 978-0-7613-3466-8";
        assert_eq!(title(citation), "Stars and Galaxies");
    }

    #[test]
    fn test_title_falls_back_to_whole_citation() {
        let citation = "An unpunctuated pamphlet title";
        assert_eq!(title(citation), citation);
    }

    #[test]
    fn test_author_up_to_parenthesis() {
        let citation = "Verma, Archana (2007). Cultural and Visual Flux at Early Historical Bagh.";
        assert_eq!(author(citation), "Verma, Archana");
    }

    #[test]
    fn test_author_up_to_period() {
        let citation = "Sir Monier Monier-Williams; Ernst Leumann. A Sanskrit-English Dictionary.";
        assert_eq!(author(citation), "Sir Monier Monier-Williams; Ernst Leumann");
    }

    #[test]
    fn test_year_first_token() {
        let citation = "Aisin-Gioro, Puyi (1989) [First published 1964]. From Emperor to Citizen.";
        assert_eq!(year(citation), 1989);
    }

    #[test]
    fn test_year_absent_is_zero() {
        assert_eq!(year("Undated manuscript, author unknown"), 0);
        // 1066 is outside the 19xx/20xx window the heuristic recognizes.
        assert_eq!(year("Chronicle of 1066"), 0);
    }
}
