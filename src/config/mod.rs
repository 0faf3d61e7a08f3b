//! Configuration management.

mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engines::EngineKind;
use crate::extraction::{ExtractOptions, PageStrategy};
use crate::utils::{RetryConfig, DEFAULT_USER_AGENT};

/// Environment variable prefix for overrides (`SCHOLAR_DIGEST_EXTRACTION__PARALLEL=true`)
pub const ENV_PREFIX: &str = "SCHOLAR_DIGEST";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "scholar-digest.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Text extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Document download settings
    #[serde(default)]
    pub downloads: DownloadConfig,

    /// Results-page harvesting settings
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Backend used to decode pages
    #[serde(default)]
    pub engine: EngineKind,

    /// Decode pages concurrently on the worker pool
    #[serde(default)]
    pub parallel: bool,

    /// Number of pool workers
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Never read past this many pages
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Which pages to decode
    #[serde(default)]
    pub strategy: PageStrategy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            parallel: false,
            pool_size: default_pool_size(),
            max_pages: default_max_pages(),
            strategy: PageStrategy::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            max_pages: self.max_pages,
            strategy: self.strategy,
            parallel: self.parallel,
        }
    }
}

fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_max_pages() -> usize {
    20
}

/// Download configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory for temporary document files (system temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Maximum file size for downloads (in MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per download, transient failures only
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            max_file_size_mb: default_max_file_size(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            user_agent: default_user_agent(),
        }
    }
}

impl DownloadConfig {
    pub fn max_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::default().max_attempts(self.max_attempts)
    }
}

fn default_max_file_size() -> u64 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    2
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Harvest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// User agent for results-page requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Results-page URL prefix the query is appended to
    #[serde(default = "default_search_url")]
    pub search_url: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            search_url: default_search_url(),
        }
    }
}

fn default_search_url() -> String {
    crate::harvest::SCHOLAR_URL.to_string()
}

impl HarvestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::default().max_attempts(self.max_attempts)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, plain text otherwise
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|format| format.eq_ignore_ascii_case("json"))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// First existing config file: `./scholar-digest.toml`, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|path| path.is_file())
}

/// `<config dir>/scholar-digest/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scholar-digest").join("config.toml"))
}
