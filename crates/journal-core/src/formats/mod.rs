//! # Translators
//!
//! Encodings a [`Journal`] can be exported to and imported from.
//!
//! - `json`: human-readable document using the canonical field names
//! - `canonical`: header + postcard payload, size-checked before decoding
//!
//! File I/O stays in the app layer; these are pure transformations.

pub mod canonical;
pub mod json;

use crate::model::Journal;
use crate::primitives::MAGIC_BYTES;
use crate::standardize::standardize;
use crate::JournalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub use canonical::{CanonicalHeader, journal_from_bytes, journal_to_bytes};
pub use json::{journal_from_json, journal_to_json};

/// A supported journal encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Canonical,
}

impl Format {
    /// Parse a format name.
    ///
    /// Returns `JournalError::UnsupportedFormat` for anything but JSON and
    /// the canonical binary encoding (yaml, xlsx and csv included).
    pub fn parse(name: &str) -> Result<Self, JournalError> {
        match standardize(name).as_str() {
            "json" => Ok(Self::Json),
            "canonical" | "jrnl" | "bin" | "postcard" => Ok(Self::Canonical),
            _ => Err(JournalError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, JournalError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| JournalError::UnsupportedFormat(path.display().to_string()))?;
        Self::parse(extension)
    }

    /// Guess the format of raw bytes from the canonical magic header.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(MAGIC_BYTES) {
            Self::Canonical
        } else {
            Self::Json
        }
    }

    /// Encode a journal.
    pub fn export(self, journal: &Journal) -> Result<Vec<u8>, JournalError> {
        match self {
            Self::Json => journal_to_json(journal).map(String::into_bytes),
            Self::Canonical => journal_to_bytes(journal),
        }
    }

    /// Decode a journal.
    pub fn import(self, bytes: &[u8]) -> Result<Journal, JournalError> {
        match self {
            Self::Json => journal_from_json(bytes),
            Self::Canonical => journal_from_bytes(bytes),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Canonical => f.write_str("canonical"),
        }
    }
}
