//! Citation format classification.
//!
//! Citation styles are heterogeneous free text; a small set of surface cues
//! (quoting, an editor marker, a parenthesis-wrapped year) routes each string
//! to the format-specific parser on the service side. The rules live in an
//! ordered list evaluated first-match-wins, so precedence stays explicit and
//! each rule is testable on its own.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// The parser format that applies to a citation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserFormat {
    /// A quoted chapter title is present.
    Chapter,
    /// An "(ed.)" / "(eds.)" editor annotation is present.
    Editor,
    /// A 4-digit year appears inside parentheses.
    ParentheticalYear,
    /// A bare 4-digit year with no parentheses anywhere.
    StandaloneYear,
    /// Fallback; the service applies the parenthetical-year rules.
    Default,
}

impl ParserFormat {
    /// Wire identifier, used as the path segment of the per-item parse endpoint.
    pub fn id(&self) -> &'static str {
        match self {
            ParserFormat::Chapter => "chapter",
            ParserFormat::Editor => "editor",
            ParserFormat::ParentheticalYear => "parenthetical-year",
            ParserFormat::StandaloneYear => "standalone-year",
            ParserFormat::Default => "default",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ParserFormat::Chapter => "chapter citation",
            ParserFormat::Editor => "editor citation",
            ParserFormat::ParentheticalYear => "parenthetical year",
            ParserFormat::StandaloneYear => "standalone year",
            ParserFormat::Default => "default",
        }
    }
}

impl fmt::Display for ParserFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

fn quoted_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A quoted span immediately followed by "in", "In", or a period.
    RE.get_or_init(|| Regex::new(r#"['"][^'"]*['"]\s*(?:in|In|\.)"#).unwrap())
}

fn parenthetical_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\b(?:19|20)\d{2}\b[^)]*\)").unwrap())
}

fn bare_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap())
}

/// One classification rule: a predicate and the format it selects.
struct Rule {
    format: ParserFormat,
    applies: fn(&str) -> bool,
}

/// Ordered rule list; the first matching rule wins.
const RULES: &[Rule] = &[
    Rule {
        format: ParserFormat::Chapter,
        applies: |citation| {
            citation.contains('"')
                || (citation.contains('\'') && quoted_span_re().is_match(citation))
        },
    },
    Rule {
        format: ParserFormat::Editor,
        applies: |citation| citation.contains("(ed.") || citation.contains("(eds."),
    },
    Rule {
        format: ParserFormat::ParentheticalYear,
        applies: |citation| {
            citation.contains('(') && parenthetical_year_re().is_match(citation)
        },
    },
    Rule {
        format: ParserFormat::StandaloneYear,
        applies: |citation| bare_year_re().is_match(citation) && !citation.contains('('),
    },
];

/// Determine which parser format applies to a citation string.
///
/// Total over all inputs; strings no rule matches classify as
/// [`ParserFormat::Default`].
pub fn classify(citation: &str) -> ParserFormat {
    RULES
        .iter()
        .find(|rule| (rule.applies)(citation))
        .map(|rule| rule.format)
        .unwrap_or(ParserFormat::Default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quote_is_chapter() {
        let citation = r#"Butrica, Andrew J. (1996). "Chapter 5". In To See the Unseen. NASA History Office. ISBN 978-0-16-048578-7"#;
        assert_eq!(classify(citation), ParserFormat::Chapter);
    }

    #[test]
    fn test_single_quoted_span_before_in_is_chapter() {
        let citation = "Fink, Christina (2009). 'The Moment of the Monks' in Burma. ISBN 978-0-7425-5701-4";
        assert_eq!(classify(citation), ParserFormat::Chapter);
    }

    #[test]
    fn test_plain_apostrophe_is_not_chapter() {
        // A possessive apostrophe without a quoted span must not trip rule 1.
        let citation = "Underhill, David (1993). Australia's dangerous creatures (4th rev. ed.). Reader's Digest Services. ISBN 978-0864380180";
        assert_ne!(classify(citation), ParserFormat::Chapter);
    }

    #[test]
    fn test_editor_marker() {
        let citation =
            "Sigurdsson, Haraldur (ed.) (1999). Encyclopedia of Volcanoes. Academic Press. ISBN 978-0-12-643140-7";
        // The editor marker is checked before the parenthetical year.
        assert_eq!(classify(citation), ParserFormat::Editor);

        let plural =
            "Doe, Jane; Smith, John (eds.). Collected Essays. Example Press. ISBN 1-234-56789-0";
        assert_eq!(classify(plural), ParserFormat::Editor);
    }

    #[test]
    fn test_parenthetical_year() {
        let citation =
            "Brunner, Bernd (2007). Bears: A Brief History. Yale University Press. ISBN 978-0-300-12299-2";
        assert_eq!(classify(citation), ParserFormat::ParentheticalYear);
    }

    #[test]
    fn test_standalone_year() {
        let citation =
            "The Pink Triangle: The Nazi War Against Homosexuals, 1986, by Richard Plant. ISBN 0-8050-0600-1.";
        assert_eq!(classify(citation), ParserFormat::StandaloneYear);
    }

    #[test]
    fn test_year_in_parens_without_century_prefix_falls_through() {
        // (1066) is not a 19xx/20xx token; with no bare year outside parens
        // either, the string classifies as default.
        let citation = "Anonymous (1066). The Domesday Chronicle. Example Press.";
        assert_eq!(classify(citation), ParserFormat::Default);
    }

    #[test]
    fn test_bare_year_with_parens_elsewhere_is_not_standalone() {
        // Rule 4 requires no opening parenthesis anywhere in the string.
        let citation = "Plant, Richard. The Pink Triangle, 1986 (New Republic Books).";
        assert_ne!(classify(citation), ParserFormat::StandaloneYear);
    }

    #[test]
    fn test_unmatched_string_is_default() {
        assert_eq!(classify("An undated pamphlet"), ParserFormat::Default);
        assert_eq!(classify(""), ParserFormat::Default);
    }

    #[test]
    fn test_format_ids() {
        assert_eq!(ParserFormat::Chapter.id(), "chapter");
        assert_eq!(ParserFormat::ParentheticalYear.id(), "parenthetical-year");
        assert_eq!(ParserFormat::StandaloneYear.to_string(), "standalone-year");
    }
}
