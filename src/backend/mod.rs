//! The remote search/parse service boundary.
//!
//! The service is reached over JSON/HTTP with four request/response calls:
//! topic search, disambiguation page fetch, per-item citation parse, and
//! batch citation parse. Everything above this module depends on the
//! [`Backend`] trait rather than the transport, so the session and the parse
//! orchestrator run unchanged against [`MockBackend`] in tests.

mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

use crate::classify::ParserFormat;
use crate::models::{SearchOutcome, StructuredCitation};
use async_trait::async_trait;

/// Interface to the remote search and citation-parse service.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Search the knowledge source for a topic.
    async fn search(&self, query: &str) -> Result<SearchOutcome, BackendError>;

    /// Fetch the citations of a specific page, resolving a disambiguation choice.
    async fn search_page(&self, page_title: &str) -> Result<SearchOutcome, BackendError>;

    /// Parse one citation with the format-specific parser.
    async fn parse_citation(
        &self,
        format: ParserFormat,
        citation: &str,
    ) -> Result<StructuredCitation, BackendError>;

    /// Parse an ordered citation sequence in one request.
    ///
    /// The returned vector corresponds 1:1 by position to the request order;
    /// `None` marks an entry the service could not parse.
    async fn parse_batch(
        &self,
        citations: &[String],
    ) -> Result<Vec<Option<StructuredCitation>>, BackendError>;
}

/// Errors that can occur when talking to the service.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport failure: connection, timeout, 5xx.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-OK response carrying a service-provided message.
    #[error("{0}")]
    Api(String),

    /// Malformed response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters (bad base address, empty batch).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }

    /// The message to show a user for this error.
    ///
    /// Service-provided messages are shown verbatim; everything else collapses
    /// to a generic retryable notice.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api(msg) => msg.clone(),
            _ => "Network error. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Parse(format!("JSON: {}", err))
    }
}
