//! The Journal aggregate root.

use super::{Collection, Definition, Entry, Record, TagDefinition};
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// All definitions, tag definitions and entries of one store.
///
/// Entries own their points inline; definitions own their point
/// definitions and tag attachments inline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub definitions: Collection<Definition>,
    #[serde(default)]
    pub entries: Collection<Entry>,
    #[serde(rename = "tagDefinitions", default)]
    pub tag_definitions: Collection<TagDefinition>,
}

impl Journal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a journal from flat record lists.
    #[must_use]
    pub fn from_records(definitions: Vec<Definition>, entries: Vec<Entry>) -> Self {
        Self {
            definitions: definitions.into(),
            entries: entries.into(),
            tag_definitions: Collection::new(),
        }
    }

    /// The current version of a definition, tombstoned or not.
    #[must_use]
    pub fn definition(&self, did: &str) -> Option<&Definition> {
        self.definitions.get(did)
    }

    /// The current version of an entry, tombstoned or not.
    #[must_use]
    pub fn entry(&self, eid: &str) -> Option<&Entry> {
        self.entries.get(eid)
    }

    /// Live definitions, cloned out of the journal.
    #[must_use]
    pub fn live_definitions(&self) -> Vec<Definition> {
        self.definitions.live().cloned().collect()
    }

    /// Current entries (one per `_eid`), tombstones included.
    #[must_use]
    pub fn current_entries(&self) -> Vec<Entry> {
        self.entries.current_records().cloned().collect()
    }

    /// The most recent `_updated` of any stored version, children included.
    #[must_use]
    pub fn last_updated(&self) -> Option<Timestamp> {
        let defs = self.definitions.iter().flat_map(|d| {
            std::iter::once(d.updated)
                .chain(d.points.iter().map(Record::updated))
                .chain(d.tags.iter().map(Record::updated))
        });
        let entries = self
            .entries
            .iter()
            .flat_map(|e| std::iter::once(e.updated).chain(e.points.iter().map(Record::updated)));
        let tags = self.tag_definitions.iter().map(Record::updated);

        defs.chain(entries).chain(tags).max()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Period, Scope};

    #[test]
    fn last_updated_sees_nested_children() {
        let mut def = Definition::new("d1", "D", Scope::Day);
        def.updated = Timestamp(10);
        let mut entry = Entry::new("e1", "d1", Period::new("2024-01-01"))
            .with_point("p", crate::model::PointValue::Bool(true));
        entry.updated = Timestamp(20);
        let key = crate::standardize::LogicalKey::new("p");
        if let Some(point) = entry.points.current_mut(&key) {
            point.updated = Timestamp(30);
        }

        let journal = Journal::from_records(vec![def], vec![entry]);
        assert_eq!(journal.last_updated(), Some(Timestamp(30)));
    }

    #[test]
    fn empty_journal_has_no_last_update() {
        assert_eq!(Journal::new().last_updated(), None);
    }

    #[test]
    fn json_shape_uses_underscored_fields() {
        let def = Definition::new("d1", "Mood", Scope::Week);
        let journal = Journal::from_records(vec![def], vec![]);

        let value = serde_json::to_value(&journal).expect("serialize");
        assert_eq!(value["definitions"][0]["_did"], "d1");
        assert_eq!(value["definitions"][0]["scope"], "week");
        assert!(value["entries"].as_array().is_some_and(Vec::is_empty));
    }
}
