//! Utility modules shared by the harvester and the summarizer.
//!
//! - [`HttpClient`]: HTTP client used for result pages and document downloads
//! - [`FetchError`]: Errors that can occur while fetching
//! - [`RetryConfig`] / [`with_retry`]: Retry transient failures with exponential backoff

mod http;
mod retry;

pub use http::{is_http_url, FetchError, HttpClient, DEFAULT_USER_AGENT};
pub use retry::{with_retry, RetryConfig, TransientError};
