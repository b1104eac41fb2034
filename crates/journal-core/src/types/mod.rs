//! # Core Type Definitions
//!
//! This module contains the shared scalar types of the Data Journal engine:
//! - Version identifiers (`Uid`)
//! - Write timestamps (`Timestamp`)
//! - Error types (`JournalError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Serialize to plain scalars so every translator sees the same shape

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// VERSION IDENTIFIER
// =============================================================================

/// Identifier of one stored version of a record.
///
/// Assigned once when the version is created and never reassigned.
/// Distinct from the logical id (`_did`, `_eid`, ...) that ties versions
/// of the same real-world record together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub String);

impl Uid {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TIMESTAMP
// =============================================================================

/// A write timestamp in milliseconds since the Unix epoch.
///
/// Integer based so comparisons are exact; this is the value the
/// last-write-wins rule compares.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Create a timestamp from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// The current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    /// Get the raw millisecond value.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Parse either raw epoch milliseconds or an RFC 3339 date-time.
    pub fn parse(s: &str) -> Result<Self, JournalError> {
        let trimmed = s.trim();
        if let Ok(ms) = trimmed.parse::<i64>() {
            return Ok(Self(ms));
        }
        chrono::DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self(dt.timestamp_millis()))
            .map_err(|e| JournalError::Validation(format!("invalid timestamp '{}': {}", s, e)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::from_timestamp_millis(self.0) {
            Some(dt) => write!(
                f,
                "{}",
                dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            ),
            None => write!(f, "{}ms", self.0),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Data Journal engine.
///
/// - No silent failures
/// - Use `Result<T, JournalError>` for fallible operations
/// - Stale writes and absent delete targets are NOT errors; they are
///   counted in `MergeStats`
#[derive(Debug, Error)]
pub enum JournalError {
    /// A query or transaction is malformed (empty query, bad id, bad period).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A field reference does not name any known field.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A translator was asked for an encoding it does not support.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
