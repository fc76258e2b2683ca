//! Search outcome models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort key for the citation display order.
///
/// `None` keeps the order the service returned; the other keys sort by a
/// field derived either from the structured record or from the raw text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    None,
    TitleAsc,
    TitleDesc,
    AuthorAsc,
    AuthorDesc,
    YearAsc,
    YearDesc,
}

impl SortKey {
    /// Stable identifier used on the CLI and in serialized session snapshots.
    pub fn id(&self) -> &'static str {
        match self {
            SortKey::None => "none",
            SortKey::TitleAsc => "title-asc",
            SortKey::TitleDesc => "title-desc",
            SortKey::AuthorAsc => "author-asc",
            SortKey::AuthorDesc => "author-desc",
            SortKey::YearAsc => "year-asc",
            SortKey::YearDesc => "year-desc",
        }
    }

    /// Whether this key inverts the comparator.
    pub fn is_descending(&self) -> bool {
        matches!(
            self,
            SortKey::TitleDesc | SortKey::AuthorDesc | SortKey::YearDesc
        )
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SortKey::None),
            "title-asc" => Ok(SortKey::TitleAsc),
            "title-desc" => Ok(SortKey::TitleDesc),
            "author-asc" => Ok(SortKey::AuthorAsc),
            "author-desc" => Ok(SortKey::AuthorDesc),
            "year-asc" => Ok(SortKey::YearAsc),
            "year-desc" => Ok(SortKey::YearDesc),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

/// One resolved page of search results.
///
/// `citations` is the canonical ordered collection; a citation's identity is
/// its position here, referenced by every parsed map and display ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    /// The query that produced this page.
    pub query: String,

    /// Title of the resolved topic page.
    pub page_title: String,

    /// Raw citation strings in service order.
    pub citations: Vec<String>,
}

impl ResultPage {
    /// Create a result page.
    pub fn new(
        query: impl Into<String>,
        page_title: impl Into<String>,
        citations: Vec<String>,
    ) -> Self {
        Self {
            query: query.into(),
            page_title: page_title.into(),
            citations,
        }
    }

    /// Number of citations on the page.
    pub fn len(&self) -> usize {
        self.citations.len()
    }

    /// Whether the page carries no citations.
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }
}

/// How the service qualified an ambiguous outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    /// The topic matches several distinct pages.
    Disambiguation,
    /// The topic matched nothing; these are near-miss candidates.
    Suggestions,
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicKind::Disambiguation => write!(f, "disambiguation"),
            TopicKind::Suggestions => write!(f, "suggestions"),
        }
    }
}

/// A candidate topic offered instead of a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicOption {
    /// Exact page title to request via the page-content endpoint.
    pub title: String,

    /// Optional human-oriented description of the candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
}

impl TopicOption {
    /// Create a topic option.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            display_text: None,
        }
    }

    /// Set the display text.
    pub fn display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }

    /// The text to show for this option.
    pub fn label(&self) -> &str {
        self.display_text.as_deref().unwrap_or(&self.title)
    }
}

/// What a search request resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// A single topic page with its citations.
    Results(ResultPage),
    /// Several candidate topics; the caller picks one and re-requests.
    Ambiguous {
        kind: TopicKind,
        options: Vec<TopicOption>,
    },
}
