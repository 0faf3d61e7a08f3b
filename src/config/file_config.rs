//! Configuration file support for scholar-digest.
//!
//! # Configuration File Format
//!
//! ```toml
//! [extraction]
//! engine = "pdf-extract"   # pdf-extract | lopdf | layout
//! parallel = false
//! pool_size = 8
//! max_pages = 20
//!
//! [extraction.strategy]
//! kind = "portion"         # all | portion
//! start_percent = 33
//! end_percent = 33
//!
//! [downloads]
//! temp_dir = "/tmp/scholar-digest"
//! max_file_size_mb = 100
//! timeout_secs = 30
//! max_attempts = 2
//!
//! [harvest]
//! max_attempts = 2
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

/// A configuration file on disk
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    config: Config,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        let config = toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))?;

        Ok(Self::new(path, config))
    }

    /// Save configuration to its TOML file, creating parent directories
    pub fn save(&self) -> Result<(), ConfigFileError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(&self.path, self.to_toml()?).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(&self.config).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
