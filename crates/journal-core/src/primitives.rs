//! # Primitives
//!
//! Fixed runtime constants of the Data Journal engine.
//!
//! These are compiled into the binary and immutable at runtime.

/// Magic bytes for the canonical binary format header.
///
/// - File Header = Magic Bytes ("JRNL") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"JRNL";

/// Current canonical format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the canonical header (magic + version).
pub const HEADER_LEN: usize = 5;

/// Maximum allowed payload size for the canonical format.
///
/// Validated BEFORE attempting deserialization.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 256 * 1024 * 1024; // 256 MB

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for logical ids (`_did`, `_eid`, `_pid`, `_tid`) and `_uid`.
///
/// Longer ids are rejected by the Validator.
pub const MAX_ID_LENGTH: usize = 256;

/// Maximum length for free text (labels, notes, text point values).
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Maximum number of instructions in a single transaction.
///
/// Larger transactions are rejected by the Validator.
pub const MAX_TRANSACTION_INSTRUCTIONS: usize = 100_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"JRNL");
        assert_eq!(HEADER_LEN, MAGIC_BYTES.len() + 1);
    }
}
