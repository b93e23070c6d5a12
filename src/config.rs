//! Engine configuration
//!
//! Optional JSON file; every field has a default.
//!
//! ```json
//! { "duplicate_index": "ignore", "log_level": "WARN", "id_prefix": "book-" }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::DuplicateIndexPolicy;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "FOLIO_CONFIG_READ",
            ConfigError::Parse(_) => "FOLIO_CONFIG_PARSE",
            ConfigError::Invalid(_) => "FOLIO_CONFIG_INVALID",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// What `create_index` does for an already indexed key pattern
    #[serde(default)]
    pub duplicate_index: DuplicateIndexPolicy,

    /// Minimum log severity (default: INFO).
    ///
    /// The logger is process-wide, so this takes effect only through
    /// [`EngineConfig::apply_log_level`].
    #[serde(default)]
    pub log_level: Severity,

    /// Prefix for generated document identifiers
    #[serde(default)]
    pub id_prefix: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_index: DuplicateIndexPolicy::Reject,
            log_level: Severity::Info,
            id_prefix: None,
        }
    }
}

impl EngineConfig {
    /// Reads, parses and validates a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json_str(&raw)?;
        let path_str = path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("duplicate_index", config.duplicate_index.as_str()),
                ("log_level", config.log_level.as_str()),
                ("path", &path_str),
            ],
        );
        Ok(config)
    }

    /// Parses and validates configuration JSON
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(prefix) = &self.id_prefix {
            if prefix.is_empty() {
                return Err(ConfigError::Invalid(
                    "id_prefix must not be empty; omit it instead".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Sets the process-wide minimum log severity. Affects every store.
    pub fn apply_log_level(&self) {
        Logger::set_min_severity(self.log_level);
    }

    pub fn with_duplicate_index(mut self, policy: DuplicateIndexPolicy) -> Self {
        self.duplicate_index = policy;
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }
}
