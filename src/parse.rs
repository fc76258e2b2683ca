//! Parse orchestration: turning raw citations into an index-keyed map of
//! structured records.
//!
//! Two strategies are supported. Per-item classifies each citation and fires
//! one tagged request per string, all concurrently; each request settles on
//! its own and a failure leaves only that index absent. Batch sends the whole
//! ordered sequence in one request and maps the response positionally; a
//! request-level failure leaves the map fully absent.
//!
//! A successful batch call always replaces the entire map. Nothing here
//! merges into a previous map, so re-running a parse over identical inputs
//! yields an identical map.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::backend::{Backend, BackendError};
use crate::classify::classify;
use crate::models::ParsedCitationMap;

/// Drives per-item and batch parsing against the service.
#[derive(Debug, Clone)]
pub struct ParseOrchestrator {
    backend: Arc<dyn Backend>,
}

impl ParseOrchestrator {
    /// Create an orchestrator over the given backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Parse each citation independently with its classified format.
    ///
    /// All requests are in flight concurrently. A failed item is logged and
    /// left absent; the rest of the map is unaffected.
    pub async fn parse_per_item(&self, citations: &[String]) -> ParsedCitationMap {
        let requests = citations.iter().enumerate().map(|(index, citation)| {
            let backend = Arc::clone(&self.backend);
            async move {
                let format = classify(citation);
                match backend.parse_citation(format, citation).await {
                    Ok(record) => Some((index, record)),
                    Err(err) => {
                        tracing::warn!(index, format = %format, error = %err, "citation parse failed");
                        None
                    }
                }
            }
        });

        join_all(requests).await.into_iter().flatten().collect()
    }

    /// Parse the whole ordered sequence in a single request.
    ///
    /// Response entries correspond 1:1 by position; `None` entries stay
    /// absent in the map. A request-level failure yields an error and no map.
    pub async fn parse_batch(
        &self,
        citations: &[String],
    ) -> Result<ParsedCitationMap, BackendError> {
        if citations.is_empty() {
            return Ok(ParsedCitationMap::new());
        }

        let results = self.backend.parse_batch(citations).await?;

        if results.len() != citations.len() {
            return Err(BackendError::Parse(format!(
                "batch response has {} entries for {} citations",
                results.len(),
                citations.len()
            )));
        }

        Ok(results
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| record.map(|r| (index, r)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockCall};
    use crate::classify::ParserFormat;
    use crate::models::StructuredCitation;

    fn work(title: &str, year: &str) -> StructuredCitation {
        serde_json::from_str(&format!(r#"{{"title":"{}","year":"{}"}}"#, title, year)).unwrap()
    }

    fn chapter(chapter_title: &str, book_title: &str, year: &str) -> StructuredCitation {
        serde_json::from_str(&format!(
            r#"{{"chapter_title":"{}","book_title":"{}","year":"{}"}}"#,
            chapter_title, book_title, year
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_batch_maps_positionally() {
        let mock = Arc::new(MockBackend::new());
        mock.push_batch(Ok(vec![
            Some(work("A", "2001")),
            Some(chapter("Ch", "B", "1999")),
        ]));

        let orchestrator = ParseOrchestrator::new(mock);
        let citations = vec!["A (2001)".to_string(), "\"Ch\" in B (1999)".to_string()];
        let map = orchestrator.parse_batch(&citations).await.unwrap();

        assert_eq!(map.len(), 2);
        assert!(!map[&0].is_chapter());
        assert!(map[&1].is_chapter());
    }

    #[tokio::test]
    async fn test_batch_null_entries_stay_absent() {
        let mock = Arc::new(MockBackend::new());
        mock.push_batch(Ok(vec![Some(work("A", "2001")), None, Some(work("C", "2003"))]));

        let orchestrator = ParseOrchestrator::new(mock);
        let citations = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let map = orchestrator.parse_batch(&citations).await.unwrap();

        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&0));
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));
    }

    #[tokio::test]
    async fn test_batch_failure_yields_no_map() {
        let mock = Arc::new(MockBackend::new());
        mock.push_batch(Err(BackendError::Api("parser unavailable".into())));

        let orchestrator = ParseOrchestrator::new(mock);
        let citations = vec!["a".to_string()];
        assert!(orchestrator.parse_batch(&citations).await.is_err());
    }

    #[tokio::test]
    async fn test_batch_length_mismatch_is_an_error() {
        let mock = Arc::new(MockBackend::new());
        mock.push_batch(Ok(vec![Some(work("A", "2001"))]));

        let orchestrator = ParseOrchestrator::new(mock);
        let citations = vec!["a".to_string(), "b".to_string()];
        let result = orchestrator.parse_batch(&citations).await;
        assert!(matches!(result, Err(BackendError::Parse(_))));
    }

    #[tokio::test]
    async fn test_batch_empty_input_skips_request() {
        let mock = Arc::new(MockBackend::new());
        let orchestrator = ParseOrchestrator::new(Arc::clone(&mock) as Arc<dyn Backend>);

        let map = orchestrator.parse_batch(&[]).await.unwrap();
        assert!(map.is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_per_item_tags_each_request_with_its_format() {
        let mock = Arc::new(MockBackend::new());
        let quoted = "\"Chapter 5\". In To See the Unseen (1996)".to_string();
        let plain = "Brunner, Bernd (2007). Bears: A Brief History.".to_string();
        mock.set_parse_result(quoted.clone(), chapter("Chapter 5", "To See the Unseen", "1996"));
        mock.set_parse_result(plain.clone(), work("Bears: A Brief History", "2007"));

        let orchestrator = ParseOrchestrator::new(Arc::clone(&mock) as Arc<dyn Backend>);
        let citations = vec![quoted.clone(), plain.clone()];
        let map = orchestrator.parse_per_item(&citations).await;

        assert_eq!(map.len(), 2);
        let calls = mock.calls();
        assert!(calls.contains(&MockCall::Parse(ParserFormat::Chapter, quoted)));
        assert!(calls.contains(&MockCall::Parse(ParserFormat::ParentheticalYear, plain)));
    }

    #[tokio::test]
    async fn test_per_item_failure_leaves_index_absent() {
        let mock = Arc::new(MockBackend::new());
        let known = "Known, Author (2001). A Title.".to_string();
        mock.set_parse_result(known.clone(), work("A Title", "2001"));

        let orchestrator = ParseOrchestrator::new(mock);
        let citations = vec!["unscripted citation".to_string(), known];
        let map = orchestrator.parse_per_item(&citations).await;

        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&0));
        assert!(map.contains_key(&1));
    }

    #[tokio::test]
    async fn test_parse_is_idempotent() {
        let mock = Arc::new(MockBackend::new());
        mock.push_batch(Ok(vec![Some(work("A", "2001")), None]));
        mock.push_batch(Ok(vec![Some(work("A", "2001")), None]));

        let orchestrator = ParseOrchestrator::new(mock);
        let citations = vec!["a".to_string(), "b".to_string()];
        let first = orchestrator.parse_batch(&citations).await.unwrap();
        let second = orchestrator.parse_batch(&citations).await.unwrap();
        assert_eq!(first, second);
    }
}
