//! Structured citation records returned by the parse service.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder shown when the service omitted a work or book title.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Placeholder shown when the service omitted a book title on a chapter record.
pub const UNKNOWN_BOOK: &str = "Unknown Book";

/// Placeholder shown when the service omitted an author field.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Mapping from a citation's original position in the search response to its
/// structured record. Absence of a key means parsing was not attempted for
/// that index or failed; there is no partial-record state.
///
/// The map is rebuilt from scratch on every new search and on every batch
/// parse. Display order is always computed separately, so entries never move.
pub type ParsedCitationMap = HashMap<usize, StructuredCitation>;

/// A citation parsed into structured fields.
///
/// The service discriminates the two shapes by the presence of a
/// `chapter_title` field: a chapter-in-book citation carries book and chapter
/// fields, a standalone work carries a single title/authors pair. Untagged
/// deserialization tries `Chapter` first, so any record with a chapter title
/// lands in that variant and everything else falls through to `Work`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredCitation {
    /// A chapter inside an edited or authored book.
    Chapter(ChapterCitation),
    /// A standalone work (book, report, monograph).
    Work(WorkCitation),
}

/// Structured fields for a chapter-in-book citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterCitation {
    pub chapter_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_text: Option<String>,
}

/// Structured fields for a standalone work citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCitation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_text: Option<String>,
}

impl StructuredCitation {
    /// Whether this record describes a chapter inside a book.
    pub fn is_chapter(&self) -> bool {
        matches!(self, StructuredCitation::Chapter(_))
    }

    /// The primary title for display and sorting.
    ///
    /// Precedence: work title, then chapter title, then book title. Falls back
    /// to a placeholder so callers never handle a missing name.
    pub fn primary_title(&self) -> &str {
        match self {
            StructuredCitation::Work(w) => w
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(UNKNOWN_TITLE),
            StructuredCitation::Chapter(c) => {
                if !c.chapter_title.trim().is_empty() {
                    &c.chapter_title
                } else {
                    c.book_title
                        .as_deref()
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or(UNKNOWN_BOOK)
                }
            }
        }
    }

    /// The primary author field for display and sorting.
    ///
    /// Precedence: work authors, then chapter authors, then book authors.
    pub fn primary_authors(&self) -> &str {
        match self {
            StructuredCitation::Work(w) => w
                .authors
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or(UNKNOWN_AUTHOR),
            StructuredCitation::Chapter(c) => c
                .chapter_authors
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .or_else(|| {
                    c.book_authors
                        .as_deref()
                        .filter(|a| !a.trim().is_empty())
                })
                .unwrap_or(UNKNOWN_AUTHOR),
        }
    }

    /// The publication year as a number, 0 when absent or non-numeric.
    pub fn year_value(&self) -> u32 {
        let year = match self {
            StructuredCitation::Work(w) => w.year.as_deref(),
            StructuredCitation::Chapter(c) => c.year.as_deref(),
        };
        year.and_then(|y| y.trim().parse().ok()).unwrap_or(0)
    }

    /// The raw year string, if the service supplied one.
    pub fn year(&self) -> Option<&str> {
        match self {
            StructuredCitation::Work(w) => w.year.as_deref(),
            StructuredCitation::Chapter(c) => c.year.as_deref(),
        }
    }

    /// The ISBN, if the service supplied one.
    pub fn isbn(&self) -> Option<&str> {
        match self {
            StructuredCitation::Work(w) => w.isbn.as_deref(),
            StructuredCitation::Chapter(c) => c.isbn.as_deref(),
        }
    }

    /// Trailing text the parser could not assign to a field.
    pub fn remaining_text(&self) -> Option<&str> {
        match self {
            StructuredCitation::Work(w) => w.remaining_text.as_deref(),
            StructuredCitation::Chapter(c) => c.remaining_text.as_deref(),
        }
    }
}
