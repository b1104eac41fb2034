//! Entries and their points.

use super::{Collection, Patch, Record, RecordRef};
use crate::scope::Period;
use crate::standardize::LogicalKey;
use crate::{Timestamp, Uid};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// POINT VALUE
// =============================================================================

/// The value recorded for one point of an entry.
///
/// Externally tagged, e.g. `{"number": 7.5}` or `{"list": ["a", "b"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
}

impl PointValue {
    /// Numeric reading of the value; booleans count as 0 or 1.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(_) | Self::List(_) => None,
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

// =============================================================================
// ENTRY
// =============================================================================

/// One recorded instance of a Definition at a given period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "_uid")]
    pub uid: Uid,
    #[serde(rename = "_created")]
    pub created: Timestamp,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_deleted", default)]
    pub deleted: bool,
    #[serde(rename = "_eid")]
    pub eid: String,
    #[serde(rename = "_did")]
    pub did: String,
    #[serde(rename = "_period")]
    pub period: Period,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub points: Collection<EntryPoint>,
}

impl Entry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(eid: impl Into<String>, did: impl Into<String>, period: Period) -> Self {
        let now = Timestamp::now();
        Self {
            uid: Uid::generate(),
            created: now,
            updated: now,
            deleted: false,
            eid: eid.into(),
            did: did.into(),
            period,
            note: None,
            points: Collection::new(),
        }
    }

    /// Record a point value, adopting this entry's `_eid`.
    #[must_use]
    pub fn with_point(mut self, pid: impl Into<String>, value: PointValue) -> Self {
        let mut point = EntryPoint::new(self.eid.clone(), pid, value);
        point.created = self.created;
        point.updated = self.updated;
        self.points.insert(point);
        self
    }

    /// The live value of a point.
    #[must_use]
    pub fn value(&self, pid: &str) -> Option<&PointValue> {
        self.points
            .get(pid)
            .filter(|p| !p.deleted)
            .map(|p| &p.value)
    }
}

impl Record for Entry {
    type Patch = EntryPatch;
    type Ref = EntryRef;

    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.eid)
    }

    base_accessors!();

    fn merge_patch(&self, patch: &EntryPatch) -> Self {
        Self {
            uid: self.uid.clone(),
            created: self.created,
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(self.deleted),
            eid: self.eid.clone(),
            did: patch.did.clone().unwrap_or_else(|| self.did.clone()),
            period: patch.period.clone().unwrap_or_else(|| self.period.clone()),
            note: patch.note.clone().or_else(|| self.note.clone()),
            points: self.points.clone(),
        }
    }

    fn from_patch(patch: &EntryPatch) -> Self {
        Self {
            uid: patch.uid.clone().unwrap_or_else(Uid::generate),
            created: patch.created.unwrap_or(patch.updated),
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(false),
            eid: patch.eid.clone(),
            did: patch.did.clone().unwrap_or_default(),
            period: patch.period.clone().unwrap_or_else(|| Period::new("")),
            note: patch.note.clone(),
            points: Collection::new(),
        }
    }

    fn content_eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.created == other.created
            && self.updated == other.updated
            && self.deleted == other.deleted
            && self.eid == other.eid
            && self.did == other.did
            && self.period == other.period
            && self.note == other.note
    }
}

/// Partial update of an [`Entry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(rename = "_eid")]
    pub eid: String,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    /// With `created`, only read when the append creates the entry.
    #[serde(rename = "_uid", default)]
    pub uid: Option<Uid>,
    #[serde(rename = "_created", default)]
    pub created: Option<Timestamp>,
    #[serde(rename = "_deleted", default)]
    pub deleted: Option<bool>,
    #[serde(rename = "_did", default)]
    pub did: Option<String>,
    #[serde(rename = "_period", default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub note: Option<String>,
}

impl EntryPatch {
    /// An empty patch for `eid`, stamped `updated`.
    #[must_use]
    pub fn new(eid: impl Into<String>, updated: Timestamp) -> Self {
        Self {
            eid: eid.into(),
            updated,
            uid: None,
            created: None,
            deleted: None,
            did: None,
            period: None,
            note: None,
        }
    }
}

impl Patch for EntryPatch {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.eid)
    }

    fn updated(&self) -> Timestamp {
        self.updated
    }
}

/// Names an [`Entry`] to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    #[serde(rename = "_eid")]
    pub eid: String,
}

impl EntryRef {
    #[must_use]
    pub fn new(eid: impl Into<String>) -> Self {
        Self { eid: eid.into() }
    }
}

impl RecordRef for EntryRef {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.eid)
    }
}

// =============================================================================
// ENTRY POINT
// =============================================================================

/// The value of one point definition within one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    #[serde(rename = "_uid")]
    pub uid: Uid,
    #[serde(rename = "_created")]
    pub created: Timestamp,
    #[serde(rename = "_updated")]
    pub updated: Timestamp,
    #[serde(rename = "_deleted", default)]
    pub deleted: bool,
    #[serde(rename = "_eid")]
    pub eid: String,
    #[serde(rename = "_pid")]
    pub pid: String,
    pub value: PointValue,
}

impl EntryPoint {
    /// Create a new entry point stamped with the current time.
    #[must_use]
    pub fn new(eid: impl Into<String>, pid: impl Into<String>, value: PointValue) -> Self {
        let now = Timestamp::now();
        Self {
            uid: Uid::generate(),
            created: now,
            updated: now,
            deleted: false,
            eid: eid.into(),
            pid: pid.into(),
            value,
        }
    }
}

impl Record for EntryPoint {
    type Patch = EntryPointPatch;
    type Ref = EntryPointRef;

    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.pid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.eid))
    }

    base_accessors!();

    fn merge_patch(&self, patch: &EntryPointPatch) -> Self {
        Self {
            uid: self.uid.clone(),
            created: self.created,
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(self.deleted),
            eid: self.eid.clone(),
            pid: self.pid.clone(),
            value: patch.value.clone().unwrap_or_else(|| self.value.clone()),
        }
    }

    fn from_patch(patch: &EntryPointPatch) -> Self {
        Self {
            uid: patch.uid.clone().unwrap_or_else(Uid::generate),
            created: patch.created.unwrap_or(patch.updated),
            updated: patch.updated,
            deleted: patch.deleted.unwrap_or(false),
            eid: patch.eid.clone(),
            pid: patch.pid.clone(),
            value: patch
                .value
                .clone()
                .unwrap_or_else(|| PointValue::Text(String::new())),
        }
    }
}

/// Partial update of an [`EntryPoint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPointPatch {
    #[serde(rename = "_eid")]
    pub eid: String,
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
    pub value: Option<PointValue>,
}

impl Patch for EntryPointPatch {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.pid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.eid))
    }

    fn updated(&self) -> Timestamp {
        self.updated
    }
}

/// Names an [`EntryPoint`] to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointRef {
    #[serde(rename = "_eid")]
    pub eid: String,
    #[serde(rename = "_pid")]
    pub pid: String,
}

impl RecordRef for EntryPointRef {
    fn key(&self) -> LogicalKey {
        LogicalKey::new(&self.pid)
    }

    fn parent_key(&self) -> Option<LogicalKey> {
        Some(LogicalKey::new(&self.eid))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Entry {
        Entry::new("e1", "mood", Period::new("2024-03-09"))
            .with_point("score", PointValue::Number(7.0))
    }

    #[test]
    fn append_note_preserves_period_and_points() {
        let original = entry();
        let mut patch = EntryPatch::new("e1", original.updated);
        patch.note = Some("x".to_string());

        let merged = original.merge_patch(&patch);

        assert_eq!(merged.note.as_deref(), Some("x"));
        assert_eq!(merged.period, original.period);
        assert_eq!(merged.points, original.points);
        assert_eq!(merged.value("score"), Some(&PointValue::Number(7.0)));
    }

    #[test]
    fn append_never_rewrites_identity() {
        let mut original = entry();
        original.created = Timestamp(5);
        let mut patch = EntryPatch::new("e1", Timestamp(original.updated.0 + 1));
        patch.uid = Some(Uid::new("other"));
        patch.created = Some(Timestamp(99));

        let merged = original.merge_patch(&patch);
        assert_eq!(merged.created, Timestamp(5));
        assert_eq!(merged.uid, original.uid);
        let fresh = Entry::from_patch(&patch);
        assert_eq!(fresh.created, Timestamp(99));
        assert_eq!(fresh.uid, Uid::new("other"));
    }

    #[test]
    fn point_values_read_as_numbers() {
        assert_eq!(PointValue::Number(2.5).as_number(), Some(2.5));
        assert_eq!(PointValue::Bool(true).as_number(), Some(1.0));
        assert_eq!(PointValue::Text("7".into()).as_number(), None);
    }

    #[test]
    fn point_value_json_is_tagged() {
        let json = serde_json::to_string(&PointValue::Number(3.0)).expect("serialize");
        assert_eq!(json, r#"{"number":3.0}"#);

        let back: PointValue = serde_json::from_str(r#"{"list":["a","b"]}"#).expect("parse");
        assert_eq!(back, PointValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn deleted_points_have_no_value() {
        let mut e = entry();
        let key = LogicalKey::new("score");
        if let Some(p) = e.points.current_mut(&key) {
            p.deleted = true;
        }
        assert!(e.value("score").is_none());
    }
}
