//! Versioned record storage keyed by logical id.

use super::Record;
use crate::Uid;
use crate::standardize::LogicalKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All stored versions of one record kind, indexed by logical id.
///
/// The *current* version of a logical id is the one with the greatest
/// `_updated`; among equal timestamps the later-inserted version wins.
/// Older versions and tombstones are kept.
///
/// Serializes as a flat list of versions in key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<R>",
    into = "Vec<R>",
    bound(
        serialize = "R: Record + Serialize",
        deserialize = "R: Record + Deserialize<'de>"
    )
)]
pub struct Collection<R> {
    versions: BTreeMap<LogicalKey, Vec<R>>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            versions: BTreeMap::new(),
        }
    }
}

impl<R> Collection<R> {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions, tombstones and history included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Number of distinct logical ids.
    #[must_use]
    pub fn logical_len(&self) -> usize {
        self.versions.len()
    }

    /// Every stored version in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.versions.values().flatten()
    }
}

impl<R: Record> Collection<R> {
    /// Store a version. No existence check is made.
    pub fn insert(&mut self, record: R) {
        self.versions.entry(record.key()).or_default().push(record);
    }

    /// Check whether a version with this `_uid` is stored.
    #[must_use]
    pub fn contains_uid(&self, uid: &Uid) -> bool {
        self.iter().any(|r| r.uid() == uid)
    }

    /// All stored versions of one logical id, oldest insertion first.
    #[must_use]
    pub fn versions(&self, key: &LogicalKey) -> &[R] {
        self.versions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The current version of a logical id.
    #[must_use]
    pub fn current(&self, key: &LogicalKey) -> Option<&R> {
        let versions = self.versions.get(key)?;
        current_index(versions).map(|i| &versions[i])
    }

    /// The current version of a logical id, given its raw id.
    #[must_use]
    pub fn get(&self, raw_id: &str) -> Option<&R> {
        self.current(&LogicalKey::new(raw_id))
    }

    /// Mutable access to the current version of a logical id.
    pub fn current_mut(&mut self, key: &LogicalKey) -> Option<&mut R> {
        let versions = self.versions.get_mut(key)?;
        let index = current_index(versions)?;
        versions.get_mut(index)
    }

    /// The current version of every logical id, tombstones included.
    pub fn current_records(&self) -> impl Iterator<Item = &R> {
        self.versions
            .values()
            .filter_map(|versions| current_index(versions).map(|i| &versions[i]))
    }

    /// The current version of every logical id that is not deleted.
    pub fn live(&self) -> impl Iterator<Item = &R> {
        self.current_records().filter(|r| !r.is_deleted())
    }
}

fn current_index<R: Record>(versions: &[R]) -> Option<usize> {
    versions
        .iter()
        .enumerate()
        .max_by_key(|(i, r)| (r.updated(), *i))
        .map(|(i, _)| i)
}

impl<R: Record> From<Vec<R>> for Collection<R> {
    fn from(records: Vec<R>) -> Self {
        records.into_iter().collect()
    }
}

impl<R> From<Collection<R>> for Vec<R> {
    fn from(collection: Collection<R>) -> Self {
        collection.versions.into_values().flatten().collect()
    }
}

impl<R: Record> FromIterator<R> for Collection<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut collection = Self::new();
        for record in iter {
            collection.insert(record);
        }
        collection
    }
}

// =============================================================================
// TESTS
// =============================================================================
