//! Utility modules supporting the citation pipeline.
//!
//! - [`HttpClient`]: shared HTTP client with user-agent and timeout defaults
//! - [`RetryConfig`] / [`with_retry`]: automatic retry on transient errors
//! - [`clean_citation`]: strip trailing noise from a raw citation string

mod clean;
mod http;
mod retry;

pub use clean::clean_citation;
pub use http::HttpClient;
pub use retry::{api_retry_config, with_retry, RetryConfig};
