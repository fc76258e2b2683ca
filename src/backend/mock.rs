//! Mock backend for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::{Backend, BackendError};
use crate::classify::ParserFormat;
use crate::models::{ResultPage, SearchOutcome, StructuredCitation};

/// A call observed by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Search(String),
    SearchPage(String),
    Parse(ParserFormat, String),
    ParseBatch(Vec<String>),
}

type BatchResult = Result<Vec<Option<StructuredCitation>>, BackendError>;

/// A backend serving scripted outcomes and recording every call.
///
/// Outcomes are queues consumed in push order; an exhausted search queue
/// yields an empty result page, an exhausted batch queue yields all-`None`
/// entries. Batch outcomes may carry a delay so tests can hold a response
/// in flight while the session moves on.
#[derive(Debug, Default)]
pub struct MockBackend {
    search_outcomes: Mutex<VecDeque<Result<SearchOutcome, BackendError>>>,
    page_outcomes: Mutex<VecDeque<Result<SearchOutcome, BackendError>>>,
    parse_results: Mutex<HashMap<String, StructuredCitation>>,
    batch_outcomes: Mutex<VecDeque<(BatchResult, Option<Duration>)>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockBackend {
    /// Create a mock with no scripted outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next search call.
    pub fn push_search(&self, outcome: Result<SearchOutcome, BackendError>) {
        self.search_outcomes.lock().unwrap().push_back(outcome);
    }

    /// Queue the outcome of the next page-content call.
    pub fn push_page(&self, outcome: Result<SearchOutcome, BackendError>) {
        self.page_outcomes.lock().unwrap().push_back(outcome);
    }

    /// Set the per-item parse result for an exact citation string.
    pub fn set_parse_result(&self, citation: impl Into<String>, record: StructuredCitation) {
        self.parse_results
            .lock()
            .unwrap()
            .insert(citation.into(), record);
    }

    /// Queue the outcome of the next batch-parse call.
    pub fn push_batch(&self, outcome: BatchResult) {
        self.batch_outcomes.lock().unwrap().push_back((outcome, None));
    }

    /// Queue a batch-parse outcome delivered only after `delay` elapses.
    pub fn push_batch_delayed(&self, outcome: BatchResult, delay: Duration) {
        self.batch_outcomes
            .lock()
            .unwrap()
            .push_back((outcome, Some(delay)));
    }

    /// Every call the mock has seen so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn search(&self, query: &str) -> Result<SearchOutcome, BackendError> {
        self.record(MockCall::Search(query.to_string()));
        match self.search_outcomes.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(SearchOutcome::Results(ResultPage::new(
                query,
                query,
                Vec::new(),
            ))),
        }
    }

    async fn search_page(&self, page_title: &str) -> Result<SearchOutcome, BackendError> {
        self.record(MockCall::SearchPage(page_title.to_string()));
        match self.page_outcomes.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(SearchOutcome::Results(ResultPage::new(
                page_title,
                page_title,
                Vec::new(),
            ))),
        }
    }

    async fn parse_citation(
        &self,
        format: ParserFormat,
        citation: &str,
    ) -> Result<StructuredCitation, BackendError> {
        self.record(MockCall::Parse(format, citation.to_string()));
        self.parse_results
            .lock()
            .unwrap()
            .get(citation)
            .cloned()
            .ok_or_else(|| BackendError::Api(format!("no parse result for '{}'", citation)))
    }

    async fn parse_batch(
        &self,
        citations: &[String],
    ) -> Result<Vec<Option<StructuredCitation>>, BackendError> {
        self.record(MockCall::ParseBatch(citations.to_vec()));
        let next = self.batch_outcomes.lock().unwrap().pop_front();
        match next {
            Some((outcome, delay)) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                outcome
            }
            None => Ok(vec![None; citations.len()]),
        }
    }
}
