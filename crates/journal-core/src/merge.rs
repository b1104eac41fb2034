//! # Merge Engine
//!
//! Applies a [`Transaction`] to a [`Journal`], producing a new Journal.
//!
//! Record kinds are applied parents first (tag definitions, definitions,
//! point definitions, tags, entries, entry points). Within one kind the
//! instruction lists run in the fixed order `create`, `overwrite`,
//! `append`, `delete`, so one transaction may create a record and patch it.
//!
//! ## Conflict Rule (last write wins)
//!
//! An `overwrite` or `append` is discarded when the existing current
//! version has a strictly newer `_updated`. Equal timestamps favor the
//! incoming write, which makes replaying a transaction a no-op.
//!
//! ## History
//!
//! Creates and overwrites carrying a new `_uid` are stored beside the
//! versions they supersede; nothing is purged. Appends and deletes act on
//! the current version in place and never change its `_uid`, so every
//! replayed instruction either finds its `_uid` stored or lands on the
//! same version it did the first time.
//!
//! ## Non-validation
//!
//! The engine reconciles, it does not validate. Malformed records are
//! stored as given; see [`crate::validate::Validator`] for the boundary
//! checks callers run before committing.

use crate::model::{
    Collection, Definition, Entry, EntryPoint, Journal, Patch, PointDefinition, Record,
    RecordRef, Tag, TagDefinition,
};
use crate::standardize::LogicalKey;
use crate::transaction::{Bucket, Transaction};
use serde::{Deserialize, Serialize};

// =============================================================================
// MERGE STATISTICS
// =============================================================================

/// Outcome counts of one commit.
///
/// None of these are errors: stale writes, replays, orphans and missing
/// delete targets are expected steady-state behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeStats {
    /// Instructions that changed the journal.
    pub applied: usize,
    /// Overwrites/appends discarded because the stored version is newer.
    pub stale: usize,
    /// Writes that changed nothing because their `_uid` was already stored.
    pub replayed: usize,
    /// Child instructions whose parent record does not exist.
    pub orphaned: usize,
    /// Deletes whose target does not exist.
    pub missing: usize,
}

impl MergeStats {
    /// Instructions that left the journal unchanged.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.stale + self.replayed + self.orphaned + self.missing
    }
}

// =============================================================================
// COLLECTION LOOKUP
// =============================================================================

/// Resolves the collection a record kind lives in.
///
/// Top-level kinds ignore the parent key; nested kinds live inside the
/// current version of their parent.
pub trait Locate: Record {
    fn locate<'a>(
        journal: &'a mut Journal,
        parent: Option<&LogicalKey>,
    ) -> Option<&'a mut Collection<Self>>;
}

impl Locate for TagDefinition {
    fn locate<'a>(
        journal: &'a mut Journal,
        _parent: Option<&LogicalKey>,
    ) -> Option<&'a mut Collection<Self>> {
        Some(&mut journal.tag_definitions)
    }
}

impl Locate for Definition {
    fn locate<'a>(
        journal: &'a mut Journal,
        _parent: Option<&LogicalKey>,
    ) -> Option<&'a mut Collection<Self>> {
        Some(&mut journal.definitions)
    }
}

impl Locate for Entry {
    fn locate<'a>(
        journal: &'a mut Journal,
        _parent: Option<&LogicalKey>,
    ) -> Option<&'a mut Collection<Self>> {
        Some(&mut journal.entries)
    }
}

impl Locate for PointDefinition {
    fn locate<'a>(
        journal: &'a mut Journal,
        parent: Option<&LogicalKey>,
    ) -> Option<&'a mut Collection<Self>> {
        let definition = journal.definitions.current_mut(parent?)?;
        Some(&mut definition.points)
    }
}

impl Locate for Tag {
    fn locate<'a>(
        journal: &'a mut Journal,
        parent: Option<&LogicalKey>,
    ) -> Option<&'a mut Collection<Self>> {
        let definition = journal.definitions.current_mut(parent?)?;
        Some(&mut definition.tags)
    }
}

impl Locate for EntryPoint {
    fn locate<'a>(
        journal: &'a mut Journal,
        parent: Option<&LogicalKey>,
    ) -> Option<&'a mut Collection<Self>> {
        let entry = journal.entries.current_mut(parent?)?;
        Some(&mut entry.points)
    }
}

// =============================================================================
// MERGE ENGINE
// =============================================================================

/// The MergeEngine reconciles transactions into journals.
pub struct MergeEngine;

impl MergeEngine {
    /// Apply a transaction, returning the new journal.
    ///
    /// The input journal is left untouched so callers can diff before and
    /// after.
    #[must_use]
    pub fn commit(journal: &Journal, tx: &Transaction) -> Journal {
        Self::commit_with_stats(journal, tx).0
    }

    /// Apply a transaction, returning the new journal and outcome counts.
    #[must_use]
    pub fn commit_with_stats(journal: &Journal, tx: &Transaction) -> (Journal, MergeStats) {
        let mut next = journal.clone();
        let mut stats = MergeStats::default();

        apply_bucket(&mut next, &tx.tag_definitions, &mut stats);
        apply_bucket(&mut next, &tx.definitions, &mut stats);
        apply_bucket(&mut next, &tx.point_definitions, &mut stats);
        apply_bucket(&mut next, &tx.tags, &mut stats);
        apply_bucket(&mut next, &tx.entries, &mut stats);
        apply_bucket(&mut next, &tx.entry_points, &mut stats);

        (next, stats)
    }
}

fn apply_bucket<R: Locate>(journal: &mut Journal, bucket: &Bucket<R>, stats: &mut MergeStats) {
    for record in &bucket.create {
        match R::locate(journal, record.parent_key().as_ref()) {
            Some(collection) => create(collection, record, stats),
            None => stats.orphaned += 1,
        }
    }
    for record in &bucket.overwrite {
        match R::locate(journal, record.parent_key().as_ref()) {
            Some(collection) => overwrite(collection, record, stats),
            None => stats.orphaned += 1,
        }
    }
    for patch in &bucket.append {
        match R::locate(journal, patch.parent_key().as_ref()) {
            Some(collection) => append(collection, patch, stats),
            None => stats.orphaned += 1,
        }
    }
    for target in &bucket.delete {
        match R::locate(journal, target.parent_key().as_ref()) {
            Some(collection) => delete(collection, target, stats),
            None => stats.missing += 1,
        }
    }
}

/// Insert without an existence check on the logical id.
///
/// A version whose `_uid` is already stored is a replay and is skipped.
fn create<R: Record>(collection: &mut Collection<R>, record: &R, stats: &mut MergeStats) {
    if collection.contains_uid(record.uid()) {
        stats.replayed += 1;
        return;
    }
    collection.insert(record.clone());
    stats.applied += 1;
}

/// Store `record` as the newest version of its logical id.
///
/// A record repeating the current `_uid` is rewritten in place. Any other
/// unseen `_uid` is added beside the versions it supersedes, which stay as
/// history. A `_uid` already stored behind the current version is a replay.
fn overwrite<R: Record>(collection: &mut Collection<R>, record: &R, stats: &mut MergeStats) {
    let key = record.key();
    let Some(existing) = collection.current(&key) else {
        collection.insert(record.clone());
        stats.applied += 1;
        return;
    };

    if existing.updated() > record.updated() {
        stats.stale += 1;
    } else if existing.uid() == record.uid() {
        rewrite_current(collection, &key, record.clone(), stats);
    } else if collection.contains_uid(record.uid()) {
        stats.replayed += 1;
    } else {
        collection.insert(record.clone());
        stats.applied += 1;
    }
}

/// Merge `patch` into the current version in place; `_uid` is kept.
fn append<R: Record>(collection: &mut Collection<R>, patch: &R::Patch, stats: &mut MergeStats) {
    let key = patch.key();
    let merged = match collection.current(&key) {
        Some(existing) if existing.updated() > patch.updated() => {
            stats.stale += 1;
            return;
        }
        Some(existing) => existing.merge_patch(patch),
        None => {
            collection.insert(R::from_patch(patch));
            stats.applied += 1;
            return;
        }
    };
    rewrite_current(collection, &key, merged, stats);
}

fn rewrite_current<R: Record>(
    collection: &mut Collection<R>,
    key: &LogicalKey,
    record: R,
    stats: &mut MergeStats,
) {
    if let Some(current) = collection.current_mut(key) {
        if *current == record {
            stats.replayed += 1;
        } else {
            *current = record;
            stats.applied += 1;
        }
    }
}

fn delete<R: Record>(collection: &mut Collection<R>, target: &R::Ref, stats: &mut MergeStats) {
    match collection.current_mut(&target.key()) {
        Some(record) => {
            record.set_deleted(true);
            stats.applied += 1;
        }
        None => stats.missing += 1,
    }
}

// =============================================================================
// TESTS
// =============================================================================
