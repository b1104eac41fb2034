//! Journal summary counts.

use crate::Timestamp;
use crate::model::{Collection, Journal, Record};
use serde::{Deserialize, Serialize};

/// Counts for one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindOverview {
    /// Logical ids whose current version is live.
    pub current: usize,
    /// Logical ids whose current version is a tombstone.
    pub deleted: usize,
    /// Every stored version, history included.
    pub versions: usize,
}

impl KindOverview {
    fn of<R: Record>(collection: &Collection<R>) -> Self {
        let mut overview = Self {
            versions: collection.len(),
            ..Self::default()
        };
        for record in collection.current_records() {
            if record.is_deleted() {
                overview.deleted += 1;
            } else {
                overview.current += 1;
            }
        }
        overview
    }

    fn add(mut self, other: Self) -> Self {
        self.current += other.current;
        self.deleted += other.deleted;
        self.versions += other.versions;
        self
    }
}

/// Summary of a journal, per record kind.
///
/// Nested kinds are counted inside the current version of their parent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub tag_definitions: KindOverview,
    pub definitions: KindOverview,
    pub point_definitions: KindOverview,
    pub tags: KindOverview,
    pub entries: KindOverview,
    pub entry_points: KindOverview,
    pub last_updated: Option<Timestamp>,
}

impl Overview {
    #[must_use]
    pub fn of(journal: &Journal) -> Self {
        Self {
            tag_definitions: KindOverview::of(&journal.tag_definitions),
            definitions: KindOverview::of(&journal.definitions),
            point_definitions: journal
                .definitions
                .current_records()
                .map(|d| KindOverview::of(&d.points))
                .fold(KindOverview::default(), KindOverview::add),
            tags: journal
                .definitions
                .current_records()
                .map(|d| KindOverview::of(&d.tags))
                .fold(KindOverview::default(), KindOverview::add),
            entries: KindOverview::of(&journal.entries),
            entry_points: journal
                .entries
                .current_records()
                .map(|e| KindOverview::of(&e.points))
                .fold(KindOverview::default(), KindOverview::add),
            last_updated: journal.last_updated(),
        }
    }
}
