//! # Configuration
//!
//! Layered configuration for the journal binary, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`journal.toml` in the working directory, or `--config`)
//! 3. Environment: `JOURNAL_DB`, `JOURNAL_LOG_FORMAT`
//! 4. CLI flags
//!
//! ```toml
//! database = "journal.json"
//! format = "json"          # or "canonical"; inferred from the extension when absent
//! log_filter = "journal=debug"
//! log_format = "text"      # or "json"
//! ```

use journal_core::{Format, JournalError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "journal.toml";

/// Journal file used when nothing else names one.
pub const DEFAULT_DATABASE: &str = "journal.json";

/// Tracing filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "journal=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `json` selects JSON lines; anything else is text.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Resolved configuration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    /// Path of the journal file.
    pub database: PathBuf,
    /// Encoding of the journal file; inferred when `None`.
    pub format: Option<Format>,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            format: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl JournalConfig {
    /// Parse a TOML document. Unknown keys are rejected.
    pub fn from_toml(text: &str) -> Result<Self, JournalError> {
        toml::from_str(text)
            .map_err(|e| JournalError::Validation(format!("Invalid config: {}", e)))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist; the default path may be absent, in
    /// which case defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self, JournalError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|e| {
            JournalError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup("JOURNAL_DB") {
            self.database = PathBuf::from(db);
        }
        if let Some(format) = lookup("JOURNAL_LOG_FORMAT") {
            self.log_format = LogFormat::from_env_value(&format);
        }
    }

    /// The journal file encoding: configured, else from the file extension,
    /// else JSON.
    #[must_use]
    pub fn resolved_format(&self) -> Format {
        self.format
            .or_else(|| Format::from_path(&self.database).ok())
            .unwrap_or_default()
    }
}

// =============================================================================
// TESTS
// =============================================================================
