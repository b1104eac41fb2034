//! # Shared Journal
//!
//! Async facade over a [`MemoryStore`] for callers that share one journal
//! across tasks.
//!
//! Commits take the write lock for the whole validate-merge-swap, so two
//! concurrent commits are serialized and neither can lose the other's
//! updates. Queries take the read lock and see a fully applied journal.

use journal_core::{
    CommitResult, Connector, Definition, Entry, Journal, JournalError, MemoryStore, Overview,
    QueryBuilder, QueryOutput, QueryParams, Transaction,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A cloneable handle to one in-memory journal.
#[derive(Clone, Default)]
pub struct SharedJournal {
    store: Arc<RwLock<MemoryStore>>,
}

impl SharedJournal {
    /// Create an empty shared journal that validates commits.
    #[must_use]
    pub fn new() -> Self {
        Self::from_store(MemoryStore::new())
    }

    #[must_use]
    pub fn from_store(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Wrap a loaded journal.
    #[must_use]
    pub fn from_journal(journal: Journal, validate: bool) -> Self {
        Self::from_store(MemoryStore::from_journal(journal).with_validation(validate))
    }

    /// Apply a transaction. One writer at a time.
    pub async fn commit(&self, tx: &Transaction) -> Result<CommitResult, JournalError> {
        let mut store = self.store.write().await;

        match store.commit(tx) {
            Ok(result) => {
                tracing::info!(
                    instructions = tx.len(),
                    applied = result.stats.applied,
                    skipped = result.stats.skipped(),
                    changes = result.diff.total_changes(),
                    "commit applied"
                );
                if result.stats.stale > 0 || result.stats.orphaned > 0 {
                    tracing::debug!(
                        stale = result.stats.stale,
                        orphaned = result.stats.orphaned,
                        "commit discarded instructions"
                    );
                }
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(instructions = tx.len(), error = %err, "commit rejected");
                Err(err)
            }
        }
    }

    pub async fn query(&self, params: &QueryParams) -> Result<Vec<Entry>, JournalError> {
        let store = self.store.read().await;
        let entries = store.query(params)?;
        tracing::debug!(matched = entries.len(), "query");
        Ok(entries)
    }

    /// Build and run a query against the current journal.
    ///
    /// The read lock is held while the builder resolves tags and scopes, so
    /// the definitions it sees are the ones it queries.
    pub async fn run_query<F>(&self, build: F) -> Result<QueryOutput, JournalError>
    where
        F: for<'c> FnOnce(QueryBuilder<'c, MemoryStore>) -> QueryBuilder<'c, MemoryStore>,
    {
        let store = self.store.read().await;
        let output = build(QueryBuilder::new(&*store)).run()?;
        tracing::debug!(
            matched = output.entries.len(),
            rolled_up = output.rollup.is_some(),
            "query"
        );
        Ok(output)
    }

    pub async fn get_defs(&self) -> Result<Vec<Definition>, JournalError> {
        self.store.read().await.get_defs()
    }

    pub async fn get_overview(&self) -> Result<Overview, JournalError> {
        self.store.read().await.get_overview()
    }

    /// A copy of the current journal, for persisting.
    pub async fn snapshot(&self) -> Journal {
        self.store.read().await.journal().clone()
    }
}
