//! # Property-Based Tests
//!
//! Merge and standardizer invariants checked with proptest.

use journal_core::{
    Definition, DiffReport, Entry, EntryPatch, EntryRef, IncludeDeleted, Journal, MergeEngine,
    Period, QueryFilter, QueryParams, Scope, Timestamp, Transaction, Uid, standardize,
};
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

/// One instruction against the entries bucket. Every kind draws from the
/// same keys, so creates, replacements and deletes collide freely.
#[derive(Debug, Clone)]
enum Op {
    Create(usize, i64),
    Overwrite(usize, i64, u8),
    /// The flag makes the patch carry its own `_uid` and `_created`.
    Append(usize, i64, u8, bool),
    Delete(usize),
}

const KEYS: usize = 5;

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..KEYS, 0i64..6).prop_map(|(k, t)| Op::Create(k, t)),
        (0..KEYS, 0i64..6, any::<u8>()).prop_map(|(k, t, n)| Op::Overwrite(k, t, n)),
        (0..KEYS, 0i64..6, 0u8..4, any::<bool>())
            .prop_map(|(k, t, n, own)| Op::Append(k, t, n, own)),
        (0..KEYS).prop_map(Op::Delete),
    ]
}

fn eid(key: usize) -> String {
    format!("e{}", key)
}

fn entry(key: usize, uid: String, updated: i64, note: Option<String>) -> Entry {
    let mut e = Entry::new(eid(key), "d1", Period::new("2024-01-01"));
    e.uid = Uid::new(uid);
    e.created = Timestamp(0);
    e.updated = Timestamp(updated);
    e.note = note;
    e
}

fn transaction(ops: &[Op]) -> Transaction {
    let mut tx = Transaction::new();
    for (i, op) in ops.iter().enumerate() {
        let uid = format!("t{}", i);
        match *op {
            Op::Create(k, t) => tx.entries.create.push(entry(k, uid, t, None)),
            Op::Overwrite(k, t, n) => {
                tx.entries
                    .overwrite
                    .push(entry(k, uid, t, Some(n.to_string())));
            }
            Op::Append(k, t, n, own) => {
                let mut patch = EntryPatch::new(eid(k), Timestamp(t));
                // Sparse fields, so later patches leave earlier ones visible.
                match n {
                    0 => patch.note = Some(format!("n{}", i)),
                    1 => patch.period = Some(Period::new("2024-01-02")),
                    2 => patch.deleted = Some(false),
                    _ => {}
                }
                if own {
                    patch.uid = Some(Uid::new(format!("p{}", i)));
                    patch.created = Some(Timestamp(t));
                }
                tx.entries.append.push(patch);
            }
            Op::Delete(k) => tx.entries.delete.push(EntryRef::new(eid(k))),
        }
    }
    tx
}

fn base(seed: &[(usize, i64)]) -> Journal {
    let entries = seed
        .iter()
        .enumerate()
        .map(|(i, &(k, t))| entry(k, format!("b{}", i), t, None))
        .collect();
    Journal::from_records(vec![Definition::new("d1", "D", Scope::Day)], entries)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Applying the same transaction twice equals applying it once.
    #[test]
    fn merge_is_idempotent(
        seed in vec((0..KEYS, 0i64..6), 0..6),
        ops in vec(op(), 1..24)
    ) {
        let journal = base(&seed);
        let tx = transaction(&ops);

        let once = MergeEngine::commit(&journal, &tx);
        let twice = MergeEngine::commit(&once, &tx);

        prop_assert_eq!(&once, &twice);
        prop_assert!(DiffReport::between(&once, &twice).is_empty());
    }

    /// The greatest `_updated` ever submitted is the current version.
    #[test]
    fn lww_current_has_max_updated(
        writes in vec((0i64..100, any::<bool>()), 1..20)
    ) {
        let mut journal = base(&[]);
        let mut max = i64::MIN;

        for (i, &(t, as_append)) in writes.iter().enumerate() {
            let mut tx = Transaction::new();
            if as_append {
                let mut patch = EntryPatch::new("e0", Timestamp(t));
                patch.note = Some(i.to_string());
                tx.entries.append.push(patch);
            } else {
                tx.entries.overwrite.push(entry(0, format!("w{}", i), t, Some(i.to_string())));
            }
            journal = MergeEngine::commit(&journal, &tx);
            max = max.max(t);

            let current = journal.entry("e0").expect("current");
            prop_assert_eq!(current.updated, Timestamp(max));
        }
        prop_assert_eq!(journal.entries.logical_len(), 1);
    }

    /// Commit never mutates its input.
    #[test]
    fn commit_is_pure(
        seed in vec((0..KEYS, 0i64..6), 0..6),
        ops in vec(op(), 1..10)
    ) {
        let journal = base(&seed);
        let snapshot = journal.clone();
        let _ = MergeEngine::commit(&journal, &transaction(&ops));
        prop_assert_eq!(journal, snapshot);
    }

    /// `yes` returns exactly the union of `no` and `only`.
    #[test]
    fn include_deleted_partitions_entries(
        seed in vec((0usize..8, 0i64..10), 0..8),
        deletes in vec(0usize..8, 0..4)
    ) {
        let mut tx = Transaction::new();
        for k in deletes {
            tx.entries.delete.push(EntryRef::new(eid(k)));
        }
        let journal = MergeEngine::commit(&base(&seed), &tx);

        let count = |mode| {
            let params = QueryParams { include_deleted: mode, ..QueryParams::all() };
            QueryFilter::run(&params, &journal).expect("query").len()
        };

        prop_assert_eq!(
            count(IncludeDeleted::Yes),
            count(IncludeDeleted::No) + count(IncludeDeleted::Only)
        );
    }

    /// Standardizing twice changes nothing.
    #[test]
    fn standardize_is_idempotent(key in "[a-zA-Z0-9 _.\\-]{0,30}") {
        let once = standardize(&key);
        prop_assert_eq!(standardize(&once), once);
    }

    /// Case and punctuation do not matter.
    #[test]
    fn standardize_ignores_case_and_punctuation(key in "[a-zA-Z0-9]{1,20}") {
        let decorated = format!("_{}-", key.to_uppercase());
        prop_assert_eq!(standardize(&decorated), standardize(&key));
    }
}
