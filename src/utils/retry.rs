//! Retry with exponential backoff for page and document fetches.

use std::time::Duration;
use tokio::time::sleep;

use super::http::FetchError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let secs = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient failures worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// Network connectivity issues
    Network,
    /// Request timeout
    Timeout,
    /// Too many requests (429)
    TooManyRequests,
    /// Server error (5xx)
    ServerError,
}

impl TransientError {
    /// Classify a fetch error, `None` when retrying cannot help
    pub fn from_fetch_error(err: &FetchError) -> Option<Self> {
        match err {
            FetchError::Network(_) => Some(TransientError::Network),
            FetchError::Timeout(_) => Some(TransientError::Timeout),
            FetchError::Status(429) => Some(TransientError::TooManyRequests),
            FetchError::Status(code) if (500..600).contains(code) => {
                Some(TransientError::ServerError)
            }
            _ => None,
        }
    }

    /// Minimum delay to wait after this error
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::TooManyRequests => Duration::from_secs(10),
            TransientError::Timeout | TransientError::Network | TransientError::ServerError => {
                Duration::from_secs(2)
            }
        }
    }
}

/// Execute an async fetch, retrying transient failures with backoff.
///
/// Permanent errors (404, unsupported URLs, oversized responses) are
/// returned immediately.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!(
                        "Request succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_fetch_error(&error) else {
                    return Err(error);
                };

                if attempts >= config.max_attempts {
                    tracing::warn!("Request failed after {} attempts: {}", attempts, error);
                    return Err(error);
                }

                let delay = std::cmp::max(config.backoff(attempts), transient.recommended_delay());
                tracing::debug!(
                    "Transient error on attempt {}: {:?}, retrying in {:?}",
                    attempts,
                    transient,
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}
