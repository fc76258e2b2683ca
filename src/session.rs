//! The search session lifecycle.
//!
//! One session covers a query from submission to close: idle → searching →
//! {results, disambiguation, error} → closed → idle. The session is the only
//! component that talks to the search endpoints and the only owner of the
//! per-query state; every mutation replaces the affected fields wholesale
//! rather than merging, and the lock is never held across an await.
//!
//! Responses from superseded operations are dropped: each search bumps a
//! generation counter, in-flight work carries the generation it started
//! under, and a completion whose generation no longer matches is discarded.

use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::backend::{Backend, BackendError};
use crate::models::{
    ParsedCitationMap, ResultPage, SearchOutcome, SortKey, TopicKind, TopicOption,
};
use crate::parse::ParseOrchestrator;

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionPhase {
    /// No query submitted, or the previous one was closed.
    Idle,
    /// A search or page-content request is in flight.
    Searching,
    /// A resolved topic page with its citations.
    Results(ResultPage),
    /// Candidate topics awaiting a selection.
    Ambiguous {
        kind: TopicKind,
        options: Vec<TopicOption>,
    },
    /// The search failed; the message is ready for display.
    Error { message: String },
}

/// A point-in-time copy of the session state, safe to render or serialize
/// while the session keeps moving.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub sort_key: SortKey,
    pub structured_view: bool,
    /// Structured records keyed by original index; `None` until a batch
    /// parse has completed for the current result set.
    pub parsed: Option<ParsedCitationMap>,
    /// Message from a failed parse, shown alongside raw results.
    pub parse_error: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    generation: u64,
    phase: SessionPhase,
    sort_key: SortKey,
    structured_view: bool,
    parsed: Option<ParsedCitationMap>,
    parse_error: Option<String>,
}

impl SessionState {
    fn reset_secondary(&mut self) {
        self.sort_key = SortKey::default();
        self.structured_view = false;
        self.parsed = None;
        self.parse_error = None;
    }
}

/// The per-query state machine.
pub struct SearchSession {
    backend: Arc<dyn Backend>,
    orchestrator: ParseOrchestrator,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("state", &self.state)
            .finish()
    }
}

impl SearchSession {
    /// Create an idle session over the given backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            orchestrator: ParseOrchestrator::new(Arc::clone(&backend)),
            backend,
            state: Mutex::new(SessionState {
                generation: 0,
                phase: SessionPhase::Idle,
                sort_key: SortKey::default(),
                structured_view: false,
                parsed: None,
                parse_error: None,
            }),
        }
    }

    /// Submit a query.
    ///
    /// Clears all previous result-bearing state, runs the search, and settles
    /// in results, disambiguation, or error. A non-empty result set is handed
    /// to the batch orchestrator right away; its outcome lands in the parsed
    /// map unless a newer operation has superseded this one.
    pub async fn search(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        let generation = self.begin_operation();
        let outcome = self.backend.search(query).await;
        self.settle_search(generation, outcome).await;
    }

    /// Resolve a disambiguation or suggestion choice by page title.
    ///
    /// Flows through the same settle path as a direct search.
    pub async fn select_topic(&self, page_title: &str) {
        {
            let state = self.lock();
            if !matches!(state.phase, SessionPhase::Ambiguous { .. }) {
                tracing::warn!(phase = ?state.phase, "topic selection outside disambiguation");
                return;
            }
        }

        self.open_page(page_title).await;
    }

    /// Fetch a page's citations directly by title.
    pub async fn open_page(&self, page_title: &str) {
        let generation = self.begin_operation();
        let outcome = self.backend.search_page(page_title).await;
        self.settle_search(generation, outcome).await;
    }

    /// Turn structured view on or off.
    ///
    /// Turning it on runs a batch parse only when no parsed map exists for
    /// the current result set; turning it off keeps the map so toggling back
    /// is free.
    pub async fn set_structured_view(&self, on: bool) {
        let pending = {
            let mut state = self.lock();
            state.structured_view = on;
            if !on || state.parsed.is_some() {
                None
            } else {
                match &state.phase {
                    SessionPhase::Results(page) if !page.is_empty() => {
                        Some((state.generation, page.citations.clone()))
                    }
                    _ => None,
                }
            }
        };

        if let Some((generation, citations)) = pending {
            let result = self.orchestrator.parse_batch(&citations).await;
            self.settle_parse(generation, result);
        }
    }

    /// Change the sort key for the display order.
    pub fn set_sort_key(&self, key: SortKey) {
        self.lock().sort_key = key;
    }

    /// Close the results and return to idle.
    ///
    /// Bumps the generation so anything still in flight is discarded when it
    /// lands.
    pub fn close(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.phase = SessionPhase::Idle;
        state.reset_secondary();
    }

    /// Copy the current state for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            phase: state.phase.clone(),
            sort_key: state.sort_key,
            structured_view: state.structured_view,
            parsed: state.parsed.clone(),
            parse_error: state.parse_error.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // The lock is only ever held for field access, never across an await.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move to searching under a fresh generation, dropping prior state.
    fn begin_operation(&self) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.phase = SessionPhase::Searching;
        state.reset_secondary();
        state.generation
    }

    async fn settle_search(&self, generation: u64, outcome: Result<SearchOutcome, BackendError>) {
        let citations = {
            let mut state = self.lock();
            if state.generation != generation {
                tracing::warn!(generation, current = state.generation, "stale search response discarded");
                return;
            }
            match outcome {
                Ok(SearchOutcome::Results(page)) => {
                    let citations = page.citations.clone();
                    state.phase = SessionPhase::Results(page);
                    citations
                }
                Ok(SearchOutcome::Ambiguous { kind, options }) => {
                    state.phase = SessionPhase::Ambiguous { kind, options };
                    return;
                }
                Err(err) => {
                    tracing::debug!(error = %err, "search failed");
                    state.phase = SessionPhase::Error {
                        message: err.user_message(),
                    };
                    return;
                }
            }
        };

        if citations.is_empty() {
            return;
        }

        let result = self.orchestrator.parse_batch(&citations).await;
        self.settle_parse(generation, result);
    }

    fn settle_parse(&self, generation: u64, result: Result<ParsedCitationMap, BackendError>) {
        let mut state = self.lock();
        if state.generation != generation {
            tracing::warn!(generation, current = state.generation, "stale parse response discarded");
            return;
        }
        match result {
            Ok(map) => {
                state.parsed = Some(map);
                state.parse_error = None;
            }
            Err(err) => {
                // Non-fatal: raw citations stay on display.
                tracing::warn!(error = %err, "batch parse failed");
                state.parsed = None;
                state.parse_error = Some(err.user_message());
            }
        }
    }
}
