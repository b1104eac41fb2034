//! # Data Model
//!
//! Canonical record shapes of the Data Journal.
//!
//! Every record carries the same four base fields:
//! - `_uid`: identifier of this stored version, assigned once
//! - `_created`: when the logical record was first created
//! - `_updated`: when this version was written (the merge tie-breaker)
//! - `_deleted`: soft-delete flag; deleted records stay stored as tombstones
//!
//! | Kind            | Logical id      | Stored in                       |
//! |-----------------|-----------------|---------------------------------|
//! | Definition      | `_did`          | `Journal::definitions`          |
//! | PointDefinition | `_did` + `_pid` | `Definition::points`            |
//! | Tag             | `_did` + `_tid` | `Definition::tags`              |
//! | TagDefinition   | `_tid`          | `Journal::tag_definitions`      |
//! | Entry           | `_eid`          | `Journal::entries`              |
//! | EntryPoint      | `_eid` + `_pid` | `Entry::points`                 |
//!
//! Child kinds are nested inside their parent, so their collection key is
//! only the child id; the parent id selects which collection they live in.

use crate::standardize::LogicalKey;
use crate::{Timestamp, Uid};
use std::fmt::Debug;

/// Implements the base-field accessors of [`Record`] for a struct with
/// `uid`, `created`, `updated` and `deleted` fields.
macro_rules! base_accessors {
    () => {
        fn uid(&self) -> &$crate::Uid {
            &self.uid
        }

        fn created(&self) -> $crate::Timestamp {
            self.created
        }

        fn updated(&self) -> $crate::Timestamp {
            self.updated
        }

        fn is_deleted(&self) -> bool {
            self.deleted
        }

        fn set_deleted(&mut self, deleted: bool) {
            self.deleted = deleted;
        }
    };
}

mod collection;
mod definition;
mod entry;
mod journal;

pub use collection::Collection;
pub use definition::{
    Definition, DefinitionPatch, DefinitionRef, PointDefinition, PointDefinitionPatch,
    PointDefinitionRef, PointType, RollupStrategy, Tag, TagDefinition, TagDefinitionPatch,
    TagDefinitionRef, TagPatch, TagRef,
};
pub use entry::{Entry, EntryPatch, EntryPoint, EntryPointPatch, EntryPointRef, EntryRef, PointValue};
pub use journal::Journal;

// =============================================================================
// RECORD TRAITS
// =============================================================================

/// A versioned record stored in a [`Collection`].
pub trait Record: Clone + PartialEq + Debug {
    /// Partial update applied by an `append` instruction.
    type Patch: Patch;

    /// Logical reference named by a `delete` instruction.
    type Ref: RecordRef;

    /// Standardized logical id within the owning collection.
    fn key(&self) -> LogicalKey;

    /// Standardized logical id of the parent record, for nested kinds.
    fn parent_key(&self) -> Option<LogicalKey> {
        None
    }

    fn uid(&self) -> &Uid;
    fn created(&self) -> Timestamp;
    fn updated(&self) -> Timestamp;
    fn is_deleted(&self) -> bool;
    fn set_deleted(&mut self, deleted: bool);

    /// Shallow field merge: fields present in the patch win, every other
    /// field keeps its existing value. `_uid` and `_created` are never
    /// taken from the patch.
    #[must_use]
    fn merge_patch(&self, patch: &Self::Patch) -> Self;

    /// Build a record from a patch whose target does not exist yet.
    ///
    /// Fields the patch leaves out take empty values.
    fn from_patch(patch: &Self::Patch) -> Self;

    /// Compare own fields, ignoring nested child collections.
    fn content_eq(&self, other: &Self) -> bool {
        self == other
    }
}

/// A partial record carried by an `append` instruction.
pub trait Patch: Clone + PartialEq + Debug {
    fn key(&self) -> LogicalKey;

    fn parent_key(&self) -> Option<LogicalKey> {
        None
    }

    fn updated(&self) -> Timestamp;
}

/// The logical id named by a `delete` instruction.
pub trait RecordRef: Clone + PartialEq + Debug {
    fn key(&self) -> LogicalKey;

    fn parent_key(&self) -> Option<LogicalKey> {
        None
    }
}
