//! # Shared Journal Tests
//!
//! Concurrent commits and queries through `SharedJournal`.

use journal::SharedJournal;
use journal_core::{
    Definition, Entry, EntryPatch, PointDefinition, PointType, PointValue, QueryParams, Scope,
    Period, Timestamp, Transaction,
};

async fn seeded() -> SharedJournal {
    let shared = SharedJournal::new();
    let mut tx = Transaction::new();
    tx.definitions.create.push(
        Definition::new("mood", "Mood", Scope::Day)
            .with_point(PointDefinition::new("mood", "score", "Score", PointType::Number)),
    );
    shared.commit(&tx).await.expect("seed");
    shared
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_are_not_lost() {
    let shared = seeded().await;

    let mut handles = Vec::new();
    for i in 0..50 {
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            let mut tx = Transaction::new();
            tx.entries
                .create
                .push(Entry::new(format!("e{}", i), "mood", Period::new("2024-01-01")));
            shared.commit(&tx).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("commit");
    }

    let entries = shared.query(&QueryParams::all()).await.expect("query");
    assert_eq!(entries.len(), 50);
    assert_eq!(shared.get_overview().await.expect("overview").entries.current, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_keep_newest() {
    let shared = seeded().await;
    let mut tx = Transaction::new();
    let mut entry = Entry::new("e1", "mood", Period::new("2024-01-01"));
    entry.created = Timestamp(0);
    entry.updated = Timestamp(0);
    tx.entries.create.push(entry);
    shared.commit(&tx).await.expect("create");

    let mut handles = Vec::new();
    for i in 1..=20i64 {
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            let mut patch = EntryPatch::new("e1", Timestamp(i));
            patch.note = Some(i.to_string());
            let mut tx = Transaction::new();
            tx.entries.append.push(patch);
            shared.commit(&tx).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("commit");
    }

    let journal = shared.snapshot().await;
    let current = journal.entry("e1").expect("entry");
    assert_eq!(current.updated, Timestamp(20));
    assert_eq!(current.note.as_deref(), Some("20"));
}

#[tokio::test]
async fn rejected_commit_changes_nothing() {
    let shared = seeded().await;
    let before = shared.snapshot().await;

    let mut tx = Transaction::new();
    tx.entries
        .create
        .push(Entry::new("e1", "unknown", Period::new("2024-01-01")));

    assert!(shared.commit(&tx).await.is_err());
    assert_eq!(shared.snapshot().await, before);
}

#[tokio::test]
async fn run_query_rolls_up() {
    let shared = seeded().await;
    let mut tx = Transaction::new();
    for (i, day) in ["2024-01-01", "2024-01-02", "2024-02-01"].iter().enumerate() {
        tx.entries.create.push(
            Entry::new(format!("e{}", i), "mood", Period::new(*day))
                .with_point("score", PointValue::Number(2.0)),
        );
    }
    shared.commit(&tx).await.expect("commit");

    let output = shared
        .run_query(|q| q.did("mood").rollup(Scope::Month).sort_by("period"))
        .await
        .expect("query");

    assert_eq!(output.entries.len(), 3);
    let rollup = output.rollup.expect("rollup");
    let january = rollup.get("2024-01", "mood", "score").expect("bucket");
    assert_eq!(january.samples, 2);
    assert_eq!(january.value, Some(PointValue::Number(4.0)));
}

#[tokio::test]
async fn unfiltered_query_is_rejected() {
    let shared = seeded().await;
    let result = shared.run_query(|q| q).await;
    assert!(result.is_err());
}
