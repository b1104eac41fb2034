//! # Key Standardizer
//!
//! Maps property keys and logical ids to a canonical form so that keys
//! differing only in case or punctuation compare equal:
//! `"Mood_Score"`, `"mood-score"`, `"moodScore"` and `"MOOD SCORE"` all
//! standardize to `"moodscore"`.
//!
//! The function is total and pure: every string has a standardized form,
//! and standardizing twice changes nothing.

use std::fmt;

/// Standardize a key: lowercase, then keep alphanumeric characters.
#[must_use]
pub fn standardize(key: &str) -> String {
    key.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Check whether two keys refer to the same logical property.
#[must_use]
pub fn same_key(a: &str, b: &str) -> bool {
    standardize(a) == standardize(b)
}

/// A standardized logical id, used to index record versions.
///
/// Construction always goes through [`standardize`], so two keys are equal
/// exactly when their raw forms are equivalent. Keys are never
/// deserialized; collections rebuild them from the stored ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalKey(String);

impl LogicalKey {
    /// Build the logical key for a raw id.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(standardize(raw))
    }

    /// Get the standardized key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_punctuation_are_ignored() {
        assert_eq!(standardize("Mood_Score"), "moodscore");
        assert_eq!(standardize("mood-score"), "moodscore");
        assert_eq!(standardize("moodScore"), "moodscore");
        assert_eq!(standardize("  MOOD score!"), "moodscore");
    }

    #[test]
    fn total_over_odd_input() {
        assert_eq!(standardize(""), "");
        assert_eq!(standardize("___"), "");
        assert_eq!(standardize("Émoji✨"), "émoji");
    }

    #[test]
    fn logical_keys_compare_standardized() {
        assert_eq!(LogicalKey::new("_did"), LogicalKey::new("DID"));
        assert!(same_key("defLbl", "def_lbl"));
        assert!(!same_key("did", "eid"));
    }
}
