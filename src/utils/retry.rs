//! Retry utilities with exponential backoff for resilient API calls.

use std::time::Duration;
use tokio::time::sleep;

use crate::backend::BackendError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry configuration tuned for the search/parse service
pub fn api_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(5),
        backoff_multiplier: 2.0,
    }
}

/// Execute an async operation, retrying transient failures with exponential
/// backoff.
///
/// Only errors for which [`BackendError::is_transient`] holds are retried;
/// everything else returns immediately.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, BackendError>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!(attempts, "operation succeeded after retries");
                }
                return Ok(result);
            }
            Err(error) => {
                if !error.is_transient() || attempts >= config.max_attempts {
                    return Err(error);
                }

                let exp_delay = config.initial_delay.as_secs_f64()
                    * config.backoff_multiplier.powf(attempts as f64 - 1.0);
                let delay =
                    Duration::from_secs_f64(exp_delay.min(config.max_delay.as_secs_f64()));

                tracing::debug!(
                    attempts,
                    max_attempts = config.max_attempts,
                    ?delay,
                    error = %error,
                    "transient failure, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
