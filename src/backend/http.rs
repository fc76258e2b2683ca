//! HTTP implementation of the service boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::backend::{Backend, BackendError};
use crate::classify::ParserFormat;
use crate::models::{ResultPage, SearchOutcome, StructuredCitation, TopicKind, TopicOption};
use crate::utils::{api_retry_config, with_retry, HttpClient};

/// Backend talking JSON over HTTP to the search/parse service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: HttpClient,
    base: Url,
}

impl HttpBackend {
    /// Create a backend against the given base address.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidRequest(format!("base address '{}': {}", base_url, e)))?;
        Ok(Self {
            client: HttpClient::new(timeout)?,
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::InvalidRequest(format!("endpoint '{}': {}", path, e)))
    }

    /// POST a JSON body and return the response bytes once the status is OK.
    ///
    /// 5xx answers surface as `Network` so the retry layer treats them as
    /// transient; other non-OK answers become `Api` with the service message.
    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Vec<u8>, BackendError> {
        let url = self.endpoint(path)?;

        let response = with_retry(api_retry_config(), || {
            let client = self.client.clone();
            let url = url.clone();
            async move {
                tracing::debug!(%url, "request");
                let response = client.client().post(url).json(body).send().await?;
                let status = response.status();

                if status.is_server_error() {
                    return Err(BackendError::Network(format!(
                        "service returned status {}",
                        status
                    )));
                }
                Ok(response)
            }
        })
        .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("service returned status {}", status));
            return Err(BackendError::Api(message));
        }

        Ok(bytes.to_vec())
    }

    fn search_outcome(&self, query: &str, bytes: &[u8]) -> Result<SearchOutcome, BackendError> {
        let body: SearchBody = serde_json::from_slice(bytes)?;
        match body {
            SearchBody::Success {
                query: answered_query,
                page_title,
                citations,
                count,
            } => {
                if count != citations.len() {
                    tracing::debug!(count, actual = citations.len(), "citation count mismatch");
                }
                let query = if answered_query.is_empty() {
                    query.to_string()
                } else {
                    answered_query
                };
                Ok(SearchOutcome::Results(ResultPage::new(
                    query, page_title, citations,
                )))
            }
            SearchBody::Disambiguation { options } => Ok(SearchOutcome::Ambiguous {
                kind: TopicKind::Disambiguation,
                options,
            }),
            SearchBody::Suggestions { options } => Ok(SearchOutcome::Ambiguous {
                kind: TopicKind::Suggestions,
                options,
            }),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn search(&self, query: &str) -> Result<SearchOutcome, BackendError> {
        let bytes = self
            .post_json("api/search", &SearchRequest { query })
            .await?;
        self.search_outcome(query, &bytes)
    }

    async fn search_page(&self, page_title: &str) -> Result<SearchOutcome, BackendError> {
        let bytes = self
            .post_json("api/search/page", &PageRequest { page_title })
            .await?;
        self.search_outcome(page_title, &bytes)
    }

    async fn parse_citation(
        &self,
        format: ParserFormat,
        citation: &str,
    ) -> Result<StructuredCitation, BackendError> {
        let path = format!("api/parse/{}", format.id());
        let bytes = self.post_json(&path, &ParseRequest { citation }).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn parse_batch(
        &self,
        citations: &[String],
    ) -> Result<Vec<Option<StructuredCitation>>, BackendError> {
        let bytes = self
            .post_json("api/parse/batch", &BatchRequest { citations })
            .await?;
        let body: BatchBody = serde_json::from_slice(&bytes)?;
        Ok(body.results)
    }
}

// ===== Wire types =====

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Serialize)]
struct PageRequest<'a> {
    page_title: &'a str,
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    citation: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    citations: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum SearchBody {
    Success {
        #[serde(default)]
        query: String,
        #[serde(default)]
        page_title: String,
        #[serde(default)]
        citations: Vec<String>,
        #[serde(default)]
        count: usize,
    },
    Disambiguation {
        #[serde(default)]
        options: Vec<TopicOption>,
    },
    Suggestions {
        #[serde(default)]
        options: Vec<TopicOption>,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchBody {
    results: Vec<Option<StructuredCitation>>,
}
