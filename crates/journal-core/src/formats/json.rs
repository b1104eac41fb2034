//! JSON translator.

use crate::JournalError;
use crate::model::Journal;

/// Encode a journal as pretty-printed JSON.
pub fn journal_to_json(journal: &Journal) -> Result<String, JournalError> {
    serde_json::to_string_pretty(journal)
        .map_err(|e| JournalError::SerializationError(e.to_string()))
}

/// Decode a journal from JSON bytes.
///
/// Missing collections default to empty; unknown record shapes are
/// rejected with `DeserializationError`.
pub fn journal_from_json(bytes: &[u8]) -> Result<Journal, JournalError> {
    serde_json::from_slice(bytes).map_err(|e| JournalError::DeserializationError(e.to_string()))
}
