//! # Diff Reporter
//!
//! Summarizes the difference between two journals as per-kind counts.
//!
//! Versions are matched by `_uid` (exact version identity), not by logical
//! id, so the report is meaningful for any pair of journals regardless of
//! how the second one was produced.
//!
//! For a version present in both journals:
//! - `deleted` when `_deleted` flipped from false to true
//! - `modified` otherwise, when any own field differs
//!
//! Nested children (point definitions, tags, entry points) are compared on
//! their own; a changed child does not mark its parent modified.

use crate::Uid;
use crate::model::{Journal, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Change counts for one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindDiff {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl KindDiff {
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.modified + self.deleted
    }
}

/// Change counts for every record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub tag_definitions: KindDiff,
    pub definitions: KindDiff,
    pub point_definitions: KindDiff,
    pub tags: KindDiff,
    pub entries: KindDiff,
    pub entry_points: KindDiff,
}

impl DiffReport {
    /// Compare `before` with `after`.
    #[must_use]
    pub fn between(before: &Journal, after: &Journal) -> Self {
        Self {
            tag_definitions: diff_kind(
                before.tag_definitions.iter(),
                after.tag_definitions.iter(),
            ),
            definitions: diff_kind(before.definitions.iter(), after.definitions.iter()),
            point_definitions: diff_kind(
                before.definitions.iter().flat_map(|d| d.points.iter()),
                after.definitions.iter().flat_map(|d| d.points.iter()),
            ),
            tags: diff_kind(
                before.definitions.iter().flat_map(|d| d.tags.iter()),
                after.definitions.iter().flat_map(|d| d.tags.iter()),
            ),
            entries: diff_kind(before.entries.iter(), after.entries.iter()),
            entry_points: diff_kind(
                before.entries.iter().flat_map(|e| e.points.iter()),
                after.entries.iter().flat_map(|e| e.points.iter()),
            ),
        }
    }

    /// Sum of every count of every kind.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.kinds().iter().map(|(_, k)| k.total()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }

    /// Every kind with its name, parents first.
    #[must_use]
    pub fn kinds(&self) -> [(&'static str, KindDiff); 6] {
        [
            ("tagDefinitions", self.tag_definitions),
            ("definitions", self.definitions),
            ("pointDefinitions", self.point_definitions),
            ("tags", self.tags),
            ("entries", self.entries),
            ("entryPoints", self.entry_points),
        ]
    }
}

/// Compare two journals. Shorthand for [`DiffReport::between`].
#[must_use]
pub fn diff(before: &Journal, after: &Journal) -> DiffReport {
    DiffReport::between(before, after)
}

fn diff_kind<'a, R: Record + 'a>(
    before: impl Iterator<Item = &'a R>,
    after: impl Iterator<Item = &'a R>,
) -> KindDiff {
    let before: BTreeMap<&Uid, &R> = before.map(|r| (r.uid(), r)).collect();
    let mut report = KindDiff::default();

    for record in after {
        match before.get(record.uid()) {
            None => report.created += 1,
            Some(old) if !old.is_deleted() && record.is_deleted() => report.deleted += 1,
            Some(old) if !old.content_eq(record) => report.modified += 1,
            Some(_) => {}
        }
    }

    report
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Definition, Entry, EntryRef, PointValue};
    use crate::scope::{Period, Scope};
    use crate::transaction::Transaction;
    use crate::{MergeEngine, Timestamp};

    fn base() -> Journal {
        Journal::from_records(vec![Definition::new("d1", "Mood", Scope::Day)], vec![])
    }

    #[test]
    fn created_entry_is_counted_on_entries_only() {
        let before = base();
        let mut tx = Transaction::new();
        tx.entries
            .create
            .push(Entry::new("e1", "d1", Period::new("2024-01-01")));

        let after = MergeEngine::commit(&before, &tx);
        let report = diff(&before, &after);

        assert_eq!(report.entries.created, 1);
        assert_eq!(report.definitions.created, 0);
        assert_eq!(report.total_changes(), 1);
    }

    #[test]
    fn tombstone_counts_as_deleted_not_modified() {
        let entry = Entry::new("e1", "d1", Period::new("2024-01-01"));
        let before = Journal::from_records(vec![], vec![entry]);
        let mut tx = Transaction::new();
        tx.entries.delete.push(EntryRef::new("e1"));

        let report = diff(&before, &MergeEngine::commit(&before, &tx));

        assert_eq!(report.entries.deleted, 1);
        assert_eq!(report.entries.modified, 0);
    }

    #[test]
    fn edited_field_counts_as_modified() {
        let entry = Entry::new("e1", "d1", Period::new("2024-01-01"));
        let before = Journal::from_records(vec![], vec![entry.clone()]);
        let mut edited = entry;
        edited.note = Some("edited".into());
        edited.updated = Timestamp(edited.updated.0 + 1);
        let after = Journal::from_records(vec![], vec![edited]);

        assert_eq!(diff(&before, &after).entries.modified, 1);
    }

    #[test]
    fn child_change_does_not_modify_parent() {
        let entry = Entry::new("e1", "d1", Period::new("2024-01-01"));
        let before = Journal::from_records(vec![], vec![entry.clone()]);
        let after = Journal::from_records(
            vec![],
            vec![entry.with_point("score", PointValue::Number(1.0))],
        );

        let report = diff(&before, &after);
        assert_eq!(report.entry_points.created, 1);
        assert_eq!(report.entries.modified, 0);
    }

    #[test]
    fn identical_journals_have_empty_diff() {
        let journal = base();
        assert!(diff(&journal, &journal).is_empty());
    }
}
