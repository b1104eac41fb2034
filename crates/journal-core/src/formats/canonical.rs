//! # Canonical Format
//!
//! Binary encoding of a journal.
//!
//! Format: Header (5 bytes) + postcard-serialized journal.
//! - 4 bytes: Magic ("JRNL")
//! - 1 byte: Version
//!
//! Size and header are validated BEFORE the payload is decoded, so a
//! corrupted or hostile file cannot trigger a large allocation.

use crate::model::Journal;
use crate::primitives::{FORMAT_VERSION, HEADER_LEN, MAGIC_BYTES, MAX_PERSISTENCE_PAYLOAD_SIZE};
use crate::JournalError;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header preceding every canonical payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl CanonicalHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Validate magic bytes and version.
    pub fn validate(&self) -> Result<(), JournalError> {
        if &self.magic != MAGIC_BYTES {
            return Err(JournalError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(JournalError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, JournalError> {
        let header = bytes
            .get(..HEADER_LEN)
            .ok_or_else(|| JournalError::DeserializationError("Header too short".to_string()))?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for CanonicalHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode a journal (header + payload).
pub fn journal_to_bytes(journal: &Journal) -> Result<Vec<u8>, JournalError> {
    let payload =
        postcard::to_stdvec(journal).map_err(|e| JournalError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&CanonicalHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Decode a journal.
///
/// Validates, in order: minimum size, maximum size, magic and version.
/// Only then is the payload decoded.
pub fn journal_from_bytes(bytes: &[u8]) -> Result<Journal, JournalError> {
    if bytes.len() < HEADER_LEN {
        return Err(JournalError::DeserializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(JournalError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    CanonicalHeader::from_bytes(bytes)?.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        JournalError::DeserializationError(format!("Failed to decode journal: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
