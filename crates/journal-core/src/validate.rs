//! # Validator
//!
//! Boundary checks run before a transaction reaches the merge engine.
//!
//! - Reject empty, unstandardizable or oversized ids
//! - Reject versions with `_created > _updated`
//! - Reject malformed periods and periods at the wrong scope
//! - Reject entries whose definition is unknown
//! - Reject entry points whose point definition does not belong to the
//!   owning definition
//!
//! References may be satisfied by the journal or by the transaction
//! itself, so one transaction can create a definition and its entries.

use crate::model::{
    Definition, Entry, EntryPoint, Journal, PointDefinition, Record, Tag, TagDefinition,
};
use crate::primitives::{MAX_ID_LENGTH, MAX_TEXT_LENGTH, MAX_TRANSACTION_INSTRUCTIONS};
use crate::scope::{Period, Scope};
use crate::standardize::LogicalKey;
use crate::transaction::Transaction;
use crate::{JournalError, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// What the transaction may reference: definitions with their scope and
/// point ids, tag definitions, and entry owners.
#[derive(Default)]
struct Catalog {
    definitions: BTreeMap<LogicalKey, (Option<Scope>, BTreeSet<LogicalKey>)>,
    tag_definitions: BTreeSet<LogicalKey>,
    entry_owners: BTreeMap<LogicalKey, LogicalKey>,
}

impl Catalog {
    fn build(journal: &Journal, tx: &Transaction) -> Self {
        let mut catalog = Self::default();

        for definition in journal.definitions.live() {
            catalog.add_definition(definition);
        }
        for definition in tx.definitions.create.iter().chain(&tx.definitions.overwrite) {
            catalog.add_definition(definition);
        }
        for patch in &tx.definitions.append {
            let slot = catalog
                .definitions
                .entry(LogicalKey::new(&patch.did))
                .or_default();
            if patch.scope.is_some() {
                slot.0 = patch.scope;
            }
        }

        let point_keys = tx
            .point_definitions
            .create
            .iter()
            .chain(&tx.point_definitions.overwrite)
            .map(|p| (p.did.as_str(), p.pid.as_str()))
            .chain(
                tx.point_definitions
                    .append
                    .iter()
                    .map(|p| (p.did.as_str(), p.pid.as_str())),
            );
        for (did, pid) in point_keys {
            if let Some(slot) = catalog.definitions.get_mut(&LogicalKey::new(did)) {
                slot.1.insert(LogicalKey::new(pid));
            }
        }

        catalog.tag_definitions = journal
            .tag_definitions
            .live()
            .chain(&tx.tag_definitions.create)
            .chain(&tx.tag_definitions.overwrite)
            .map(Record::key)
            .chain(tx.tag_definitions.append.iter().map(|p| LogicalKey::new(&p.tid)))
            .collect();

        for entry in journal
            .entries
            .current_records()
            .chain(&tx.entries.create)
            .chain(&tx.entries.overwrite)
        {
            catalog
                .entry_owners
                .insert(entry.key(), LogicalKey::new(&entry.did));
        }
        for patch in &tx.entries.append {
            if let Some(did) = &patch.did {
                catalog
                    .entry_owners
                    .insert(LogicalKey::new(&patch.eid), LogicalKey::new(did));
            }
        }

        catalog
    }

    fn add_definition(&mut self, definition: &Definition) {
        let slot = self.definitions.entry(definition.key()).or_default();
        slot.0 = Some(definition.scope);
        slot.1.extend(definition.points.live().map(Record::key));
    }

    fn definition(&self, did: &str) -> Result<&(Option<Scope>, BTreeSet<LogicalKey>), JournalError> {
        self.definitions.get(&LogicalKey::new(did)).ok_or_else(|| {
            JournalError::Validation(format!("unknown definition '{}'", did))
        })
    }

    fn check_point(&self, did: &str, pid: &str) -> Result<(), JournalError> {
        let (_, points) = self.definition(did)?;
        if !points.contains(&LogicalKey::new(pid)) {
            return Err(JournalError::Validation(format!(
                "point '{}' is not defined by definition '{}'",
                pid, did
            )));
        }
        Ok(())
    }
}

/// The Validator guards the merge engine against malformed transactions.
pub struct Validator;

impl Validator {
    /// Validate an id field.
    ///
    /// An id is valid if it is non-empty after standardization and no
    /// longer than `MAX_ID_LENGTH`.
    pub fn validate_id(field: &str, id: &str) -> Result<(), JournalError> {
        if LogicalKey::new(id).as_str().is_empty() {
            return Err(JournalError::Validation(format!(
                "{} '{}' is empty after standardization",
                field, id
            )));
        }
        if id.len() > MAX_ID_LENGTH {
            return Err(JournalError::Validation(format!(
                "{} exceeds {} bytes",
                field, MAX_ID_LENGTH
            )));
        }
        Ok(())
    }

    /// Validate free text such as labels and notes.
    pub fn validate_text(field: &str, text: &str) -> Result<(), JournalError> {
        if text.len() > MAX_TEXT_LENGTH {
            return Err(JournalError::Validation(format!(
                "{} exceeds {} bytes",
                field, MAX_TEXT_LENGTH
            )));
        }
        Ok(())
    }

    /// Validate a period's shape, and its scope when one is expected.
    pub fn validate_period(period: &Period, expected: Option<Scope>) -> Result<(), JournalError> {
        let (scope, _) = period.decode()?;
        match expected {
            Some(expected) if expected != scope => Err(JournalError::Validation(format!(
                "period '{}' is a {} period, expected {}",
                period, scope, expected
            ))),
            _ => Ok(()),
        }
    }

    /// Validate a transaction against the journal it will be applied to.
    pub fn validate_transaction(journal: &Journal, tx: &Transaction) -> Result<(), JournalError> {
        if tx.len() > MAX_TRANSACTION_INSTRUCTIONS {
            return Err(JournalError::Validation(format!(
                "transaction has {} instructions, maximum is {}",
                tx.len(),
                MAX_TRANSACTION_INSTRUCTIONS
            )));
        }

        let catalog = Catalog::build(journal, tx);

        for tag_definition in tx.tag_definitions.create.iter().chain(&tx.tag_definitions.overwrite) {
            Self::check_tag_definition(tag_definition)?;
        }
        for patch in &tx.tag_definitions.append {
            Self::validate_id("_tid", &patch.tid)?;
            check_patch_times(patch.created, patch.updated)?;
        }

        for definition in tx.definitions.create.iter().chain(&tx.definitions.overwrite) {
            Self::check_definition(definition, &catalog)?;
        }
        for patch in &tx.definitions.append {
            Self::validate_id("_did", &patch.did)?;
            check_patch_times(patch.created, patch.updated)?;
            if let Some(label) = &patch.label {
                Self::validate_text("label", label)?;
            }
        }

        for point in tx.point_definitions.create.iter().chain(&tx.point_definitions.overwrite) {
            Self::check_point_definition(point)?;
            catalog.definition(&point.did)?;
        }
        for patch in &tx.point_definitions.append {
            Self::validate_id("_did", &patch.did)?;
            Self::validate_id("_pid", &patch.pid)?;
            check_patch_times(patch.created, patch.updated)?;
            catalog.definition(&patch.did)?;
        }

        for tag in tx.tags.create.iter().chain(&tx.tags.overwrite) {
            Self::check_tag(tag, &catalog)?;
            catalog.definition(&tag.did)?;
        }
        for patch in &tx.tags.append {
            Self::validate_id("_did", &patch.did)?;
            Self::validate_id("_tid", &patch.tid)?;
            check_patch_times(patch.created, patch.updated)?;
            catalog.definition(&patch.did)?;
        }

        for entry in tx.entries.create.iter().chain(&tx.entries.overwrite) {
            Self::check_entry(entry, &catalog)?;
        }
        for patch in &tx.entries.append {
            Self::validate_id("_eid", &patch.eid)?;
            check_patch_times(patch.created, patch.updated)?;
            if let Some(did) = &patch.did {
                catalog.definition(did)?;
            }
            if let Some(period) = &patch.period {
                Self::validate_period(period, None)?;
            }
            if let Some(note) = &patch.note {
                Self::validate_text("note", note)?;
            }
        }

        for point in tx.entry_points.create.iter().chain(&tx.entry_points.overwrite) {
            check_base(point)?;
            Self::validate_id("_eid", &point.eid)?;
            Self::validate_id("_pid", &point.pid)?;
            let owner = owner_of(&catalog, &point.eid)?;
            catalog.check_point(owner.as_str(), &point.pid)?;
        }
        for patch in &tx.entry_points.append {
            Self::validate_id("_eid", &patch.eid)?;
            Self::validate_id("_pid", &patch.pid)?;
            check_patch_times(patch.created, patch.updated)?;
            let owner = owner_of(&catalog, &patch.eid)?;
            catalog.check_point(owner.as_str(), &patch.pid)?;
        }

        for did in tx.definitions.delete.iter().map(|r| &r.did) {
            Self::validate_id("_did", did)?;
        }
        for eid in tx.entries.delete.iter().map(|r| &r.eid) {
            Self::validate_id("_eid", eid)?;
        }

        Ok(())
    }

    fn check_tag_definition(tag_definition: &TagDefinition) -> Result<(), JournalError> {
        check_base(tag_definition)?;
        Self::validate_id("_tid", &tag_definition.tid)?;
        Self::validate_text("label", &tag_definition.label)
    }

    fn check_definition(definition: &Definition, catalog: &Catalog) -> Result<(), JournalError> {
        check_base(definition)?;
        Self::validate_id("_did", &definition.did)?;
        Self::validate_text("label", &definition.label)?;
        for point in definition.points.iter() {
            Self::check_point_definition(point)?;
            ensure_parent("_did", &point.did, &definition.did)?;
        }
        for tag in definition.tags.iter() {
            Self::check_tag(tag, catalog)?;
            ensure_parent("_did", &tag.did, &definition.did)?;
        }
        Ok(())
    }

    fn check_point_definition(point: &PointDefinition) -> Result<(), JournalError> {
        check_base(point)?;
        Self::validate_id("_did", &point.did)?;
        Self::validate_id("_pid", &point.pid)?;
        Self::validate_text("label", &point.label)
    }

    fn check_tag(tag: &Tag, catalog: &Catalog) -> Result<(), JournalError> {
        check_base(tag)?;
        Self::validate_id("_did", &tag.did)?;
        Self::validate_id("_tid", &tag.tid)?;
        if !catalog.tag_definitions.contains(&tag.key()) {
            return Err(JournalError::Validation(format!(
                "unknown tag '{}'",
                tag.tid
            )));
        }
        Ok(())
    }

    fn check_entry(entry: &Entry, catalog: &Catalog) -> Result<(), JournalError> {
        check_base(entry)?;
        Self::validate_id("_eid", &entry.eid)?;
        Self::validate_id("_did", &entry.did)?;
        if let Some(note) = &entry.note {
            Self::validate_text("note", note)?;
        }

        let (scope, _) = catalog.definition(&entry.did)?;
        Self::validate_period(&entry.period, *scope)?;

        for point in entry.points.iter() {
            check_entry_point(point)?;
            ensure_parent("_eid", &point.eid, &entry.eid)?;
            catalog.check_point(&entry.did, &point.pid)?;
        }
        Ok(())
    }
}

fn check_base<R: Record>(record: &R) -> Result<(), JournalError> {
    Validator::validate_id("_uid", record.uid().as_str())?;
    if record.created() > record.updated() {
        return Err(JournalError::Validation(format!(
            "version '{}' has _created {} after _updated {}",
            record.uid(),
            record.created(),
            record.updated()
        )));
    }
    Ok(())
}

fn check_entry_point(point: &EntryPoint) -> Result<(), JournalError> {
    check_base(point)?;
    Validator::validate_id("_pid", &point.pid)?;
    if let crate::model::PointValue::Text(text) = &point.value {
        Validator::validate_text("value", text)?;
    }
    Ok(())
}

fn check_patch_times(created: Option<Timestamp>, updated: Timestamp) -> Result<(), JournalError> {
    match created {
        Some(created) if created > updated => Err(JournalError::Validation(format!(
            "patch has _created {} after _updated {}",
            created, updated
        ))),
        _ => Ok(()),
    }
}

fn ensure_parent(field: &str, child: &str, parent: &str) -> Result<(), JournalError> {
    if LogicalKey::new(child) != LogicalKey::new(parent) {
        return Err(JournalError::Validation(format!(
            "nested record names {} '{}' inside '{}'",
            field, child, parent
        )));
    }
    Ok(())
}

fn owner_of<'a>(catalog: &'a Catalog, eid: &str) -> Result<&'a LogicalKey, JournalError> {
    catalog
        .entry_owners
        .get(&LogicalKey::new(eid))
        .ok_or_else(|| JournalError::Validation(format!("unknown entry '{}'", eid)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntryPointPatch, PointType, PointValue};

    fn journal() -> Journal {
        let def = Definition::new("mood", "Mood", Scope::Day)
            .with_point(PointDefinition::new("mood", "score", "Score", PointType::Number));
        Journal::from_records(vec![def], vec![])
    }

    fn tx_with_entry(entry: Entry) -> Transaction {
        let mut tx = Transaction::new();
        tx.entries.create.push(entry);
        tx
    }

    #[test]
    fn accepts_well_formed_entry() {
        let entry = Entry::new("e1", "mood", Period::new("2024-01-01"))
            .with_point("score", PointValue::Number(5.0));
        Validator::validate_transaction(&journal(), &tx_with_entry(entry)).expect("valid");
    }

    #[test]
    fn rejects_unknown_definition() {
        let entry = Entry::new("e1", "nope", Period::new("2024-01-01"));
        let err = Validator::validate_transaction(&journal(), &tx_with_entry(entry));
        assert!(matches!(err, Err(JournalError::Validation(_))));
    }

    #[test]
    fn accepts_definition_created_in_same_transaction() {
        let mut tx = tx_with_entry(Entry::new("e1", "sleep", Period::new("2024-W05")));
        tx.definitions
            .create
            .push(Definition::new("sleep", "Sleep", Scope::Week));
        Validator::validate_transaction(&journal(), &tx).expect("valid");
    }

    #[test]
    fn rejects_period_at_wrong_scope() {
        let entry = Entry::new("e1", "mood", Period::new("2024-01"));
        assert!(Validator::validate_transaction(&journal(), &tx_with_entry(entry)).is_err());
    }

    #[test]
    fn rejects_malformed_period() {
        let entry = Entry::new("e1", "mood", Period::new("Jan 1st"));
        assert!(Validator::validate_transaction(&journal(), &tx_with_entry(entry)).is_err());
    }

    #[test]
    fn rejects_point_of_other_definition() {
        let entry = Entry::new("e1", "mood", Period::new("2024-01-01"))
            .with_point("weight", PointValue::Number(70.0));
        assert!(Validator::validate_transaction(&journal(), &tx_with_entry(entry)).is_err());
    }

    #[test]
    fn rejects_created_after_updated() {
        let mut entry = Entry::new("e1", "mood", Period::new("2024-01-01"));
        entry.created = Timestamp(entry.updated.0 + 1);
        assert!(Validator::validate_transaction(&journal(), &tx_with_entry(entry)).is_err());
    }

    #[test]
    fn rejects_punctuation_only_id() {
        assert!(Validator::validate_id("_eid", "--").is_err());
        assert!(Validator::validate_id("_eid", &"x".repeat(MAX_ID_LENGTH + 1)).is_err());
        assert!(Validator::validate_id("_eid", "e-1").is_ok());
    }

    #[test]
    fn entry_point_needs_known_entry() {
        let mut tx = Transaction::new();
        tx.entry_points.append.push(EntryPointPatch {
            eid: "ghost".into(),
            pid: "score".into(),
            updated: Timestamp(1),
            uid: None,
            created: None,
            deleted: None,
            value: Some(PointValue::Number(1.0)),
        });
        assert!(Validator::validate_transaction(&journal(), &tx).is_err());
    }

    #[test]
    fn tag_needs_tag_definition() {
        let mut tx = Transaction::new();
        tx.tags.create.push(Tag::new("mood", "health"));
        assert!(Validator::validate_transaction(&journal(), &tx).is_err());

        tx.tag_definitions
            .create
            .push(TagDefinition::new("health", "Health"));
        Validator::validate_transaction(&journal(), &tx).expect("valid");
    }
}
