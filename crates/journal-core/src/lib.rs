//! # journal-core
//!
//! The deterministic Data Journal engine.
//!
//! This crate records user-defined metric Definitions and time-stamped
//! Entries with typed Points, merges writes from many sources with
//! last-write-wins semantics over soft-deleted records, and answers
//! filtered and aggregated queries over the result.
//!
//! ## Components (leaves first)
//!
//! - `standardize`: case/punctuation-insensitive key matching
//! - `model`: record shapes, versioned collections and the `Journal` root
//! - `merge`: applies a `Transaction` to a `Journal`
//! - `diff`: per-kind created/modified/deleted counts between journals
//! - `query` + `rollup`: filtering and period aggregation
//! - `builder`: fluent query façade over a `Connector`
//! - `connector`: the backend capability set and `MemoryStore`
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network, NO logging
//! - Deterministic: `BTreeMap`/`BTreeSet` only
//! - No ambient state: stores are constructed and passed explicitly
//! - The merge engine reconciles, it never validates; `validate` runs at
//!   the boundary

// =============================================================================
// MODULES
// =============================================================================

pub mod alias;
pub mod builder;
pub mod connector;
pub mod diff;
pub mod formats;
pub mod merge;
pub mod model;
pub mod overview;
pub mod primitives;
pub mod query;
pub mod rollup;
pub mod scope;
pub mod standardize;
pub mod transaction;
pub mod types;
pub mod validate;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{JournalError, Timestamp, Uid};

pub use model::{
    Collection, Definition, DefinitionPatch, DefinitionRef, Entry, EntryPatch, EntryPoint,
    EntryPointPatch, EntryPointRef, EntryRef, Journal, Patch, PointDefinition,
    PointDefinitionPatch, PointDefinitionRef, PointType, PointValue, Record, RecordRef,
    RollupStrategy, Tag, TagDefinition, TagDefinitionPatch, TagDefinitionRef, TagPatch, TagRef,
};
pub use scope::{Period, Scope};
pub use standardize::{LogicalKey, same_key, standardize};
pub use transaction::{Bucket, Transaction};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use builder::{IntoIdSet, QueryBuilder, QueryOutput, SortField};
pub use connector::{CommitResult, Connector, MemoryStore};
pub use diff::{DiffReport, KindDiff, diff};
pub use merge::{Locate, MergeEngine, MergeStats};
pub use overview::{KindOverview, Overview};
pub use query::{IncludeDeleted, QueryFilter, QueryParams};
pub use rollup::{Aggregate, Rollup, summarize};
pub use validate::Validator;

// =============================================================================
// RE-EXPORTS: Translators
// =============================================================================

pub use alias::AliasMap;
pub use formats::{CanonicalHeader, Format, journal_from_bytes, journal_to_bytes};
