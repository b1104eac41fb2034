//! Definitions, point definitions and tags.

use super::{Collection, Patch, Record, RecordRef};
use crate::scope::Scope;
use crate::standardize::LogicalKey;
use crate::{Timestamp, Uid};
use serde::{Deserialize, Serialize};

// =============================================================================
// POINT TYPES & ROLLUP STRATEGIES
// =============================================================================

/// The value type of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    #[default]
    Text,
    Number,
    Bool,
    Select,
    MultiSelect,
    Duration,
    Percentage,
    Date,
}

impl PointType {
    /// The rollup applied when a point definition does not name one.
    #[must_use]
    pub const fn default_rollup(self) -> RollupStrategy {
        match self {
            Self::Number | Self::Duration => RollupStrategy::Sum,
            Self::Percentage => RollupStrategy::Average,
            _ => RollupStrategy::Count,
        }
    }
}

/// How the values of one point are aggregated inside a rollup bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollupStrategy {
    Count,
    CountDistinct,
    Sum,
    Average,
    Min,
    Max,
    First,
    Last,
}

// =============================================================================
// DEFINITION
// =============================================================================

/// A user-declared trackable metric, such as "mood".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "_uid")]
    pub uid: Uid,
    #[serde(rename = "_created")]
    pub created: Timestamp,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_deleted", default)]
    pub deleted: bool,
    #[serde(rename = "_did")]
    pub did: String,
    pub label: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub points: Collection<PointDefinition>,
    #[serde(default)]
    pub tags: Collection<Tag>,
}

impl Definition {
    /// Create a new definition stamped with the current time.
    #[must_use]
    pub fn new(did: impl Into<String>, label: impl Into<String>, scope: Scope) -> Self {
        let now = Timestamp::now();
        Self {
            uid: Uid::generate(),
            created: now,
            updated: now,
            deleted: false,
            did: did.into(),
            label: label.into(),
            emoji: None,
            desc: None,
            scope,
            points: Collection::new(),
            tags: Collection::new(),
        }
    }

    /// Add a point definition, adopting this definition's `_did`.
    #[must_use]
    pub fn with_point(mut self, mut point: PointDefinition) -> Self {
        point.did = self.did.clone();
        self.points.insert(point);
        self
    }

    /// Add a tag reference.
    #[must_use]
    pub fn with_tag(mut self, tid: impl Into<String>) -> Self {
        let tag = Tag::new(self.did.clone(), tid);
        self.tags.insert(tag);
        self
    }

    /// The live point definition with this `_pid`.
    #[must_use]
    pub fn point(&self, pid: &str) -> Option<&PointDefinition> {
        self.points.get(pid).filter(|p| !p.deleted)
    }

    /// Whether a live tag with this `_tid` is attached.
    #[must_use]
    pub fn has_tag(&self, tid: &str) -> bool {
        self.tags.get(tid).is_some_and(|t| !t.deleted)
    }
}

impl Record for Definition {
    type Patch = DefinitionPatch;
    type Ref = DefinitionRef;

    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.did)
    }

    base_accessors!();

    fn merge_patch(&self, patch: &DefinitionPatch) -> Self {
        Self {
            uid: self.uid.clone(),
            created: self.created,
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(self.deleted),
            did: self.did.clone(),
            label: patch.label.clone().unwrap_or_else(|| self.label.clone()),
            emoji: patch.emoji.clone().or_else(|| self.emoji.clone()),
            desc: patch.desc.clone().or_else(|| self.desc.clone()),
            scope: patch.scope.unwrap_or(self.scope),
            points: self.points.clone(),
            tags: self.tags.clone(),
        }
    }

    fn from_patch(patch: &DefinitionPatch) -> Self {
        Self {
            uid: patch.uid.clone().unwrap_or_else(Uid::generate),
            created: patch.created.unwrap_or(patch.updated),
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(false),
            did: patch.did.clone(),
            label: patch.label.clone().unwrap_or_default(),
            emoji: patch.emoji.clone(),
            desc: patch.desc.clone(),
            scope: patch.scope.unwrap_or_default(),
            points: Collection::new(),
            tags: Collection::new(),
        }
    }

    fn content_eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.created == other.created
            && self.updated == other.updated
            && self.deleted == other.deleted
            && self.did == other.did
            && self.label == other.label
            && self.emoji == other.emoji
            && self.desc == other.desc
            && self.scope == other.scope
    }
}

/// Partial update of a [`Definition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionPatch {
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_uid", default)]
    pub uid: Option<Uid>,
    #[serde(rename = "_created", default)]
    pub created: Option<Timestamp>,
    #[serde(rename = "_deleted", default)]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
}

impl DefinitionPatch {
    /// An empty patch for `did`, stamped `updated`.
    #[must_use]
    pub fn new(did: impl Into<String>, updated: Timestamp) -> Self {
        Self {
            did: did.into(),
            updated,
            uid: None,
            created: None,
            deleted: None,
            label: None,
            emoji: None,
            desc: None,
            scope: None,
        }
    }
}

impl Patch for DefinitionPatch {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.did)
    }

    fn updated(&self) -> Timestamp {
        self.updated
    }
}

/// Names a [`Definition`] to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRef {
    #[serde(rename = "_did")]
    pub did: String,
}

impl RecordRef for DefinitionRef {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.did)
    }
}

// =============================================================================
// POINT DEFINITION
// =============================================================================

/// A typed sub-field of a Definition's entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDefinition {
    #[serde(rename = "_uid")]
    pub uid: Uid,
    #[serde(rename = "_created")]
    pub created: Timestamp,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_deleted", default)]
    pub deleted: bool,
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_pid")]
    pub pid: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: PointType,
    #[serde(default)]
    pub rollup: Option<RollupStrategy>,
    #[serde(default)]
    pub format: Option<String>,
}

impl PointDefinition {
    /// Create a new point definition stamped with the current time.
    #[must_use]
    pub fn new(
        did: impl Into<String>,
        pid: impl Into<String>,
        label: impl Into<String>,
        kind: PointType,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            uid: Uid::generate(),
            created: now,
            updated: now,
            deleted: false,
            did: did.into(),
            pid: pid.into(),
            label: label.into(),
            kind,
            rollup: None,
            format: None,
        }
    }

    /// The configured rollup, or the default for the point type.
    #[must_use]
    pub fn effective_rollup(&self) -> RollupStrategy {
        self.rollup.unwrap_or_else(|| self.kind.default_rollup())
    }
}

impl Record for PointDefinition {
    type Patch = PointDefinitionPatch;
    type Ref = PointDefinitionRef;

    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.pid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.did))
    }

    base_accessors!();

    fn merge_patch(&self, patch: &PointDefinitionPatch) -> Self {
        Self {
            uid: self.uid.clone(),
            created: self.created,
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(self.deleted),
            did: self.did.clone(),
            pid: self.pid.clone(),
            label: patch.label.clone().unwrap_or_else(|| self.label.clone()),
            kind: patch.kind.unwrap_or(self.kind),
            rollup: patch.rollup.or(self.rollup),
            format: patch.format.clone().or_else(|| self.format.clone()),
        }
    }

    fn from_patch(patch: &PointDefinitionPatch) -> Self {
        Self {
            uid: patch.uid.clone().unwrap_or_else(Uid::generate),
            created: patch.created.unwrap_or(patch.updated),
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(false),
            did: patch.did.clone(),
            pid: patch.pid.clone(),
            label: patch.label.clone().unwrap_or_default(),
            kind: patch.kind.unwrap_or_default(),
            rollup: patch.rollup,
            format: patch.format.clone(),
        }
    }
}

/// Partial update of a [`PointDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDefinitionPatch {
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_pid")]
    pub pid: String,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_uid", default)]
    pub uid: Option<Uid>,
    #[serde(rename = "_created", default)]
    pub created: Option<Timestamp>,
    #[serde(rename = "_deleted", default)]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<PointType>,
    #[serde(default)]
    pub rollup: Option<RollupStrategy>,
    #[serde(default)]
    pub format: Option<String>,
}

impl Patch for PointDefinitionPatch {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.pid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.did))
    }

    fn updated(&self) -> Timestamp {
        self.updated
    }
}

/// Names a [`PointDefinition`] to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointDefinitionRef {
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_pid")]
    pub pid: String,
}

impl RecordRef for PointDefinitionRef {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.pid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.did))
    }
}

// =============================================================================
// TAG DEFINITION
// =============================================================================

/// A named tag that definitions can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinition {
    #[serde(rename = "_uid")]
    pub uid: Uid,
    #[serde(rename = "_created")]
    pub created: Timestamp,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_deleted", default)]
    pub deleted: bool,
    #[serde(rename = "_tid")]
    pub tid: String,
    pub label: String,
}

impl TagDefinition {
    /// Create a new tag definition stamped with the current time.
    #[must_use]
    pub fn new(tid: impl Into<String>, label: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            uid: Uid::generate(),
            created: now,
            updated: now,
            deleted: false,
            tid: tid.into(),
            label: label.into(),
        }
    }
}

impl Record for TagDefinition {
    type Patch = TagDefinitionPatch;
    type Ref = TagDefinitionRef;

    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.tid)
    }

    base_accessors!();

    fn merge_patch(&self, patch: &TagDefinitionPatch) -> Self {
        Self {
            uid: self.uid.clone(),
            created: self.created,
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(self.deleted),
            tid: self.tid.clone(),
            label: patch.label.clone().unwrap_or_else(|| self.label.clone()),
        }
    }

    fn from_patch(patch: &TagDefinitionPatch) -> Self {
        Self {
            uid: patch.uid.clone().unwrap_or_else(Uid::generate),
            created: patch.created.unwrap_or(patch.updated),
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(false),
            tid: patch.tid.clone(),
            label: patch.label.clone().unwrap_or_default(),
        }
    }
}

/// Partial update of a [`TagDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinitionPatch {
    #[serde(rename = "_tid")]
    pub tid: String,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_uid", default)]
    pub uid: Option<Uid>,
    #[serde(rename = "_created", default)]
    pub created: Option<Timestamp>,
    #[serde(rename = "_deleted", default)]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub label: Option<String>,
}

impl Patch for TagDefinitionPatch {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.tid)
    }

    fn updated(&self) -> Timestamp {
        self.updated
    }
}

/// Names a [`TagDefinition`] to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinitionRef {
    #[serde(rename = "_tid")]
    pub tid: String,
}

impl RecordRef for TagDefinitionRef {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.tid)
    }
}

// =============================================================================
// TAG
// =============================================================================

/// Attachment of a tag to a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "_uid")]
    pub uid: Uid,
    #[serde(rename = "_created")]
    pub created: Timestamp,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_deleted", default)]
    pub deleted: bool,
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_tid")]
    pub tid: String,
}

impl Tag {
    /// Create a new tag attachment stamped with the current time.
    #[must_use]
    pub fn new(did: impl Into<String>, tid: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            uid: Uid::generate(),
            created: now,
            updated: now,
            deleted: false,
            did: did.into(),
            tid: tid.into(),
        }
    }
}

impl Record for Tag {
    type Patch = TagPatch;
    type Ref = TagRef;

    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.tid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.did))
    }

    base_accessors!();

    fn merge_patch(&self, patch: &TagPatch) -> Self {
        Self {
            uid: self.uid.clone(),
            created: self.created,
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(self.deleted),
            did: self.did.clone(),
            tid: self.tid.clone(),
        }
    }

    fn from_patch(patch: &TagPatch) -> Self {
        Self {
            uid: patch.uid.clone().unwrap_or_else(Uid::generate),
            created: patch.created.unwrap_or(patch.updated),
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(false),
            did: patch.did.clone(),
            tid: patch.tid.clone(),
        }
    }
}

/// Partial update of a [`Tag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPatch {
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_tid")]
    pub tid: String,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_uid", default)]
    pub uid: Option<Uid>,
    #[serde(rename = "_created", default)]
    pub created: Option<Timestamp>,
    #[serde(rename = "_deleted", default)]
    pub deleted: Option<bool>,
}

impl Patch for TagPatch {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.tid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.did))
    }

    fn updated(&self) -> Timestamp {
        self.updated
    }
}

/// Names a [`Tag`] to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_tid")]
    pub tid: String,
}

impl RecordRef for TagRef {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.tid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.did))
    }
}

// =============================================================================
// TESTS
// =============================================================================
