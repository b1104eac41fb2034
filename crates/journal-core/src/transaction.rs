//! # Transactions
//!
//! A Transaction groups write instructions per record kind. Each kind has a
//! [`Bucket`] with up to four instruction lists, always applied in the order
//! `create`, `overwrite`, `append`, `delete`.

use crate::model::{
    Definition, Entry, EntryPoint, PointDefinition, Record, Tag, TagDefinition,
};
use serde::{Deserialize, Serialize};

/// Instructions for one record kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "R: Serialize, R::Patch: Serialize, R::Ref: Serialize",
    deserialize = "R: Deserialize<'de>, R::Patch: Deserialize<'de>, R::Ref: Deserialize<'de>"
))]
pub struct Bucket<R: Record> {
    /// Records inserted as-is.
    #[serde(default)]
    pub create: Vec<R>,
    /// Complete replacements of existing records.
    #[serde(default)]
    pub overwrite: Vec<R>,
    /// Partial updates merged into existing records.
    #[serde(default)]
    pub append: Vec<R::Patch>,
    /// Logical ids to tombstone.
    #[serde(default)]
    pub delete: Vec<R::Ref>,
}

impl<R: Record> Default for Bucket<R> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            overwrite: Vec::new(),
            append: Vec::new(),
            delete: Vec::new(),
        }
    }
}

impl<R: Record> Bucket<R> {
    /// Total number of instructions in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.create.len() + self.overwrite.len() + self.append.len() + self.delete.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A set of write instructions applied together by one commit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub tag_definitions: Bucket<TagDefinition>,
    #[serde(default)]
    pub definitions: Bucket<Definition>,
    #[serde(default)]
    pub point_definitions: Bucket<PointDefinition>,
    #[serde(default)]
    pub tags: Bucket<Tag>,
    #[serde(default)]
    pub entries: Bucket<Entry>,
    #[serde(default)]
    pub entry_points: Bucket<EntryPoint>,
}

impl Transaction {
    /// Create an empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of instructions across every kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tag_definitions.len()
            + self.definitions.len()
            + self.point_definitions.len()
            + self.tags.len()
            + self.entries.len()
            + self.entry_points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
