//! # Behaviour Tier Tests (T0-T3)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Merge Semantics
//! - T1: Tombstones & Reporting
//! - T2: Query Filtering
//! - T3: Connector Round Trip

use journal_core::{
    Connector, Definition, DiffReport, Entry, EntryPatch, EntryRef, IncludeDeleted, Journal,
    JournalError, MemoryStore, MergeEngine, Period, PointDefinition, PointType, PointValue,
    QueryBuilder, QueryFilter, QueryParams, Scope, Timestamp, Transaction, Uid,
};

fn definition() -> Definition {
    Definition::new("d1", "Mood", Scope::Day)
        .with_point(PointDefinition::new("d1", "score", "Score", PointType::Number))
}

fn entry_at(eid: &str, updated: i64) -> Entry {
    let mut e = Entry::new(eid, "d1", Period::new("2024-01-01"))
        .with_point("score", PointValue::Number(1.0));
    e.uid = Uid::new(format!("{}@{}", eid, updated));
    e.created = Timestamp(0);
    e.updated = Timestamp(updated);
    e
}

// =============================================================================
// TIER T0: MERGE SEMANTICS
// =============================================================================

mod t0_merge_semantics {
    use super::*;

    /// T0.1: Repeating a transaction leaves no duplicate logical records.
    #[test]
    fn repeated_transaction_is_idempotent() {
        let journal = Journal::from_records(vec![definition()], vec![]);
        let mut tx = Transaction::new();
        tx.entries.create.push(entry_at("e1", 5));
        tx.entries.overwrite.push(entry_at("e2", 5));
        let mut patch = EntryPatch::new("e1", Timestamp(6));
        patch.note = Some("n".into());
        tx.entries.append.push(patch);

        let once = MergeEngine::commit(&journal, &tx);
        let twice = MergeEngine::commit(&once, &tx);

        assert_eq!(once, twice);
        assert_eq!(twice.entries.len(), 2);
    }

    /// T0.2: A stale overwrite leaves the stored version byte-identical.
    #[test]
    fn stale_overwrite_is_byte_identical() {
        let existing = entry_at("e1", 20);
        let journal = Journal::from_records(vec![definition()], vec![existing.clone()]);
        let mut stale = entry_at("e1", 10);
        stale.note = Some("older".into());
        let mut tx = Transaction::new();
        tx.entries.overwrite.push(stale);

        let (after, stats) = MergeEngine::commit_with_stats(&journal, &tx);

        let bytes_before = serde_json::to_vec(&existing).expect("encode");
        let bytes_after = serde_json::to_vec(after.entry("e1").expect("e1")).expect("encode");
        assert_eq!(bytes_before, bytes_after);
        assert_eq!(stats.stale, 1);
    }

    /// T0.3: Appending a note keeps period and points.
    #[test]
    fn append_preserves_untouched_fields() {
        let journal = Journal::from_records(vec![definition()], vec![entry_at("e1", 1)]);
        let mut patch = EntryPatch::new("e1", Timestamp(2));
        patch.note = Some("x".into());
        let mut tx = Transaction::new();
        tx.entries.append.push(patch);

        let after = MergeEngine::commit(&journal, &tx);

        let e1 = after.entry("e1").expect("e1");
        assert_eq!(e1.note.as_deref(), Some("x"));
        assert_eq!(e1.period.as_str(), "2024-01-01");
        assert_eq!(e1.value("score"), Some(&PointValue::Number(1.0)));
    }

    /// T0.4: A create of an existing logical id is stored as a duplicate.
    #[test]
    fn create_does_not_check_existence() {
        let journal = Journal::from_records(vec![definition()], vec![entry_at("e1", 1)]);
        let mut tx = Transaction::new();
        tx.entries.create.push(entry_at("e1", 2));

        let after = MergeEngine::commit(&journal, &tx);

        assert_eq!(after.entries.versions(&journal_core::LogicalKey::new("e1")).len(), 2);
        assert_eq!(after.entry("e1").expect("e1").updated, Timestamp(2));
    }

    /// T0.5: Create then overwrite in one transaction replays cleanly and
    /// keeps the created version as history.
    #[test]
    fn create_then_overwrite_is_idempotent() {
        let journal = Journal::from_records(vec![definition()], vec![]);
        let mut tx = Transaction::new();
        tx.entries.create.push(entry_at("e1", 1));
        tx.entries.overwrite.push(entry_at("e1", 2));

        let once = MergeEngine::commit(&journal, &tx);
        let twice = MergeEngine::commit(&once, &tx);

        assert_eq!(once, twice);
        assert!(DiffReport::between(&once, &twice).is_empty());
        let key = journal_core::LogicalKey::new("e1");
        assert_eq!(twice.entries.versions(&key).len(), 2);
        assert_eq!(twice.entry("e1").expect("e1").uid, Uid::new("e1@2"));
    }

    /// T0.6: An append never changes `_uid` or `_created` of its target.
    #[test]
    fn append_keeps_version_identity() {
        let journal = Journal::from_records(vec![definition()], vec![]);
        let mut tx = Transaction::new();
        tx.entries.create.push(entry_at("e1", 1));
        let mut patch = EntryPatch::new("e1", Timestamp(2));
        patch.uid = Some(Uid::new("p"));
        patch.created = Some(Timestamp(2));
        patch.note = Some("n".into());
        tx.entries.append.push(patch);

        let once = MergeEngine::commit(&journal, &tx);
        let twice = MergeEngine::commit(&once, &tx);

        assert_eq!(once, twice);
        assert_eq!(twice.entries.len(), 1);
        let e1 = twice.entry("e1").expect("e1");
        assert_eq!(e1.uid, Uid::new("e1@1"));
        assert_eq!(e1.created, Timestamp(0));
        assert_eq!(e1.note.as_deref(), Some("n"));
    }
}

// =============================================================================
// TIER T1: TOMBSTONES & REPORTING
// =============================================================================

mod t1_tombstones_and_reporting {
    use super::*;

    /// T1.1: Deleting keeps the journal size and marks the entry.
    #[test]
    fn delete_is_a_tombstone() {
        let journal = Journal::from_records(vec![definition()], vec![entry_at("e1", 1)]);
        let mut tx = Transaction::new();
        tx.entries.delete.push(EntryRef::new("e1"));

        let after = MergeEngine::commit(&journal, &tx);

        assert_eq!(after.entries.len(), journal.entries.len());
        assert_eq!(after.live_definitions().len(), journal.live_definitions().len());
        assert!(after.entry("e1").expect("e1").deleted);

        let mut params = QueryParams::all();
        let live = QueryFilter::run(&params, &after).expect("query");
        assert!(live.is_empty());

        params.include_deleted = IncludeDeleted::Only;
        let only = QueryFilter::run(&params, &after).expect("query");
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].eid, "e1");
    }

    /// T1.2: Creating one entry is reported on entries only.
    #[test]
    fn diff_reports_created_entry() {
        let before = Journal::from_records(vec![definition()], vec![]);
        let mut tx = Transaction::new();
        tx.entries
            .create
            .push(Entry::new("e1", "d1", Period::new("2024-01-01")));

        let after = MergeEngine::commit(&before, &tx);
        let report = DiffReport::between(&before, &after);

        assert_eq!(report.entries.created, 1);
        assert_eq!(report.definitions.created, 0);
    }

    /// T1.3: Deleting an absent record is a successful no-op.
    #[test]
    fn delete_of_absent_record_succeeds() {
        let mut store = MemoryStore::from_journal(Journal::from_records(vec![definition()], vec![]));
        let mut tx = Transaction::new();
        tx.entries.delete.push(EntryRef::new("ghost"));

        let result = store.commit(&tx).expect("commit");

        assert!(result.success);
        assert!(result.diff.is_empty());
        assert_eq!(result.stats.missing, 1);
    }
}

// =============================================================================
// TIER T2: QUERY FILTERING
// =============================================================================

mod t2_query_filtering {
    use super::*;

    /// T2.1: scopeMin('week') includes week and coarser, excludes day.
    #[test]
    fn scope_min_week() {
        let scopes = Scope::Week.at_least();
        assert_eq!(
            scopes,
            vec![Scope::Week, Scope::Month, Scope::Quarter, Scope::Year]
        );
        assert!(!scopes.contains(&Scope::Day));
    }

    /// T2.2: An empty query fails with zero entries.
    #[test]
    fn empty_query_rejected() {
        let journal = Journal::from_records(vec![definition()], vec![entry_at("e1", 1)]);

        let empty = QueryFilter::run(&QueryParams::new(), &journal);
        assert!(matches!(empty, Err(JournalError::Validation(_))));

        let only_mode = QueryParams {
            include_deleted: IncludeDeleted::Yes,
            ..QueryParams::default()
        };
        assert!(QueryFilter::run(&only_mode, &journal).is_err());

        let all = QueryFilter::run(&QueryParams::all(), &journal).expect("all");
        assert_eq!(all.len(), 1);
    }

    /// T2.3: A query JSON document drives the filter.
    #[test]
    fn query_from_json() {
        let journal = Journal::from_records(
            vec![definition(), Definition::new("w", "Weight", Scope::Week)],
            vec![entry_at("e1", 1), {
                let mut e = Entry::new("w1", "w", Period::new("2024-W02"));
                e.created = Timestamp(0);
                e
            }],
        );
        let params: QueryParams =
            serde_json::from_str(r#"{"scopeMin": "week"}"#).expect("parse");

        let result = QueryFilter::run(&params, &journal).expect("query");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].eid, "w1");
    }
}

// =============================================================================
// TIER T3: CONNECTOR ROUND TRIP
// =============================================================================

mod t3_connector_round_trip {
    use super::*;

    /// T3.1: Commit, query, roll up through the connector.
    #[test]
    fn commit_then_query_with_rollup() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::new();
        tx.definitions.create.push(definition());
        for (i, day) in ["2024-01-01", "2024-01-02", "2024-01-09"].iter().enumerate() {
            tx.entries.create.push(
                Entry::new(format!("e{}", i), "d1", Period::new(*day))
                    .with_point("score", PointValue::Number(2.0)),
            );
        }
        let result = store.commit(&tx).expect("commit");
        assert_eq!(result.diff.entries.created, 3);
        assert_eq!(result.diff.entry_points.created, 3);

        let output = QueryBuilder::new(&store)
            .def_lbl("mood")
            .rollup(Scope::Week)
            .sort_by("period")
            .run()
            .expect("run");

        assert_eq!(output.entries.len(), 3);
        let rollup = output.rollup.expect("rollup");
        let week1 = rollup.get("2024-W01", "d1", "score").expect("week 1");
        assert_eq!(week1.value, Some(PointValue::Number(4.0)));
        let week2 = rollup.get("2024-W02", "d1", "score").expect("week 2");
        assert_eq!(week2.samples, 1);
    }

    /// T3.2: The overview tracks current and deleted counts.
    #[test]
    fn overview_after_delete() {
        let mut store = MemoryStore::new();
        let mut tx = Transaction::new();
        tx.definitions.create.push(definition());
        tx.entries.create.push(entry_at("e1", 1));
        tx.entries.create.push(entry_at("e2", 1));
        store.commit(&tx).expect("seed");

        let mut tx = Transaction::new();
        tx.entries.delete.push(EntryRef::new("e2"));
        store.commit(&tx).expect("delete");

        let overview = store.get_overview().expect("overview");
        assert_eq!(overview.entries.current, 1);
        assert_eq!(overview.entries.deleted, 1);
        assert_eq!(overview.definitions.current, 1);
        assert_eq!(overview.point_definitions.current, 1);
    }
}
