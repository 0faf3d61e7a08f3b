//! HTTP client and document download helpers.

use reqwest::{Client, StatusCode};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors raised while fetching pages or documents
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unsupported URL (expected http or https): {0}")]
    UnsupportedUrl(String),

    #[error("Document not found (HTTP {0})")]
    NotFound(u16),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Response exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// The document definitely does not exist at this URL
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchError::UnsupportedUrl(_) | FetchError::NotFound(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::NotFound(code) | FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }

    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => FetchError::NotFound(status.as_u16()),
            other => FetchError::Status(other.as_u16()),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::from_status(status)
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// True for URLs the client is willing to fetch
pub fn is_http_url(url: &str) -> bool {
    url::Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, FetchError> {
        Self::with_options(DEFAULT_USER_AGENT, Duration::from_secs(30))
    }

    /// Create a client with a custom user agent and request timeout
    pub fn with_options(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        if !is_http_url(url) {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }
        Ok(response)
    }

    /// Fetch a page body as text
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get_ok(url).await?;
        Ok(response.text().await?)
    }

    /// Download a document into a fresh temporary `.pdf` file.
    ///
    /// The file is created in `temp_dir` (or the system temp directory) and
    /// removed again when the returned [`TempPath`] is dropped, including
    /// when the download fails half way.
    pub async fn download_to_temp(
        &self,
        url: &str,
        temp_dir: Option<&Path>,
        max_bytes: u64,
    ) -> Result<TempPath, FetchError> {
        let mut response = self.get_ok(url).await?;

        if let Some(length) = response.content_length() {
            if length > max_bytes {
                return Err(FetchError::TooLarge { limit: max_bytes });
            }
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("scholar-digest-").suffix(".pdf");
        let mut file = match temp_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(FetchError::TooLarge { limit: max_bytes });
            }
            file.write_all(&chunk)?;
        }
        file.flush()?;

        tracing::debug!("Downloaded {} bytes from {} to {}", written, url, file.path().display());
        Ok(file.into_temp_path())
    }
}
