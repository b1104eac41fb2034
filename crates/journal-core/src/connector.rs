//! # Connector
//!
//! The capability set the engine is driven through, and [`MemoryStore`],
//! the reference in-memory implementation.
//!
//! A store is an explicitly constructed value. Callers own it and pass it
//! where it is needed; there is no process-wide current store.

use crate::diff::DiffReport;
use crate::merge::{MergeEngine, MergeStats};
use crate::model::{Definition, Entry, Journal};
use crate::overview::Overview;
use crate::query::{QueryFilter, QueryParams};
use crate::transaction::Transaction;
use crate::validate::Validator;
use crate::JournalError;
use serde::{Deserialize, Serialize};

/// Outcome of one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitResult {
    pub success: bool,
    /// Per-kind created/modified/deleted counts.
    pub diff: DiffReport,
    /// Applied and skipped instruction counts.
    pub stats: MergeStats,
}

/// A journal backend.
pub trait Connector {
    /// Open the backend and return its live definitions.
    fn connect(&mut self) -> Result<Vec<Definition>, JournalError>;

    /// Apply a transaction atomically.
    ///
    /// Either the whole transaction is merged or an error is returned and
    /// the stored journal is untouched.
    fn commit(&mut self, tx: &Transaction) -> Result<CommitResult, JournalError>;

    /// Entries matching `params`.
    fn query(&self, params: &QueryParams) -> Result<Vec<Entry>, JournalError>;

    /// Live definitions.
    fn get_defs(&self) -> Result<Vec<Definition>, JournalError>;

    fn get_overview(&self) -> Result<Overview, JournalError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// The reference in-memory connector.
///
/// Commits compute the next journal from the current one and swap it in,
/// so readers never see a half-applied transaction. `&mut self` on commit
/// means one writer at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStore {
    journal: Journal,
    validate: bool,
}

impl MemoryStore {
    /// Create an empty store that validates transactions.
    #[must_use]
    pub fn new() -> Self {
        Self::from_journal(Journal::new())
    }

    /// Wrap an existing journal.
    #[must_use]
    pub fn from_journal(journal: Journal) -> Self {
        Self {
            journal,
            validate: true,
        }
    }

    /// Enable or disable boundary validation on commit.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    #[must_use]
    pub fn into_journal(self) -> Journal {
        self.journal
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MemoryStore {
    fn connect(&mut self) -> Result<Vec<Definition>, JournalError> {
        self.get_defs()
    }

    fn commit(&mut self, tx: &Transaction) -> Result<CommitResult, JournalError> {
        if self.validate {
            Validator::validate_transaction(&self.journal, tx)?;
        }

        let (next, stats) = MergeEngine::commit_with_stats(&self.journal, tx);
        let diff = DiffReport::between(&self.journal, &next);
        self.journal = next;

        Ok(CommitResult {
            success: true,
            diff,
            stats,
        })
    }

    fn query(&self, params: &QueryParams) -> Result<Vec<Entry>, JournalError> {
        QueryFilter::run(params, &self.journal)
    }

    fn get_defs(&self) -> Result<Vec<Definition>, JournalError> {
        Ok(self.journal.live_definitions())
    }

    fn get_overview(&self) -> Result<Overview, JournalError> {
        Ok(Overview::of(&self.journal))
    }
}

// =============================================================================
// TESTS
// =============================================================================
