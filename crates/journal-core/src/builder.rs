//! # Query Builder
//!
//! Fluent façade over [`QueryParams`] and a [`Connector`].
//!
//! Setters validate and normalize as they go. The first failing setter's
//! error is kept and returned by [`QueryBuilder::run`].
//!
//! Setters that select definitions (`did`, `tags`, `scope`, `scope_min`,
//! `scope_max`) resolve against the connector's catalog at call time and
//! write the same `did` slot: the last one called wins.

use crate::connector::Connector;
use crate::model::Entry;
use crate::query::{IncludeDeleted, QueryParams};
use crate::rollup::{Rollup, summarize};
use crate::scope::{Period, Scope};
use crate::standardize::standardize;
use crate::{JournalError, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

// =============================================================================
// ID SETS
// =============================================================================

/// Values accepted wherever a set of ids is expected.
///
/// A single id is coerced into a one-element set.
pub trait IntoIdSet {
    fn into_id_set(self) -> BTreeSet<String>;
}

impl IntoIdSet for &str {
    fn into_id_set(self) -> BTreeSet<String> {
        BTreeSet::from([self.to_string()])
    }
}

impl IntoIdSet for String {
    fn into_id_set(self) -> BTreeSet<String> {
        BTreeSet::from([self])
    }
}

impl<T: Into<String>> IntoIdSet for Vec<T> {
    fn into_id_set(self) -> BTreeSet<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<String>, const N: usize> IntoIdSet for [T; N] {
    fn into_id_set(self) -> BTreeSet<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl IntoIdSet for BTreeSet<String> {
    fn into_id_set(self) -> BTreeSet<String> {
        self
    }
}

// =============================================================================
// SORTING
// =============================================================================

/// Entry fields `run` can sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Period,
    Created,
    Updated,
    Eid,
    Did,
    Uid,
}

impl SortField {
    fn compare(self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            Self::Period => a.period.cmp(&b.period),
            Self::Created => a.created.cmp(&b.created),
            Self::Updated => a.updated.cmp(&b.updated),
            Self::Eid => a.eid.cmp(&b.eid),
            Self::Did => a.did.cmp(&b.did),
            Self::Uid => a.uid.cmp(&b.uid),
        }
    }
}

impl FromStr for SortField {
    type Err = JournalError;

    /// Accepts `period`, `_period`, `Period` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match standardize(s).as_str() {
            "period" => Ok(Self::Period),
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "eid" => Ok(Self::Eid),
            "did" => Ok(Self::Did),
            "uid" => Ok(Self::Uid),
            _ => Err(JournalError::UnknownField(s.to_string())),
        }
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// What [`QueryBuilder::run`] returns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryOutput {
    pub entries: Vec<Entry>,
    /// Present when a rollup scope was requested.
    pub rollup: Option<Rollup>,
}

/// Accumulates query parameters against one connector.
pub struct QueryBuilder<'c, C: Connector + ?Sized> {
    connector: &'c C,
    params: QueryParams,
    sort: Option<(SortField, bool)>,
    error: Option<JournalError>,
}

impl<'c, C: Connector + ?Sized> QueryBuilder<'c, C> {
    #[must_use]
    pub fn new(connector: &'c C) -> Self {
        Self {
            connector,
            params: QueryParams::new(),
            sort: None,
            error: None,
        }
    }

    /// The parameters accumulated so far.
    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    fn fail(mut self, err: JournalError) -> Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }

    /// Write the did slot with the live definitions matching `keep`.
    fn select_definitions(
        mut self,
        keep: impl Fn(&crate::model::Definition) -> bool,
    ) -> Self {
        match self.connector.get_defs() {
            Ok(defs) => {
                self.params.did = Some(
                    defs.iter()
                        .filter(|&d| keep(d))
                        .map(|d| d.did.clone())
                        .collect(),
                );
                self.params.tag = None;
                self
            }
            Err(err) => self.fail(err),
        }
    }

    #[must_use]
    pub fn include_deleted(mut self, mode: IncludeDeleted) -> Self {
        self.params.include_deleted = mode;
        self
    }

    /// Restrict to the given definition ids.
    #[must_use]
    pub fn did(mut self, ids: impl IntoIdSet) -> Self {
        self.params.did = Some(ids.into_id_set());
        self.params.tag = None;
        self
    }

    /// Restrict to definitions carrying any of the given tags.
    #[must_use]
    pub fn tags(self, tids: impl IntoIdSet) -> Self {
        let tids = tids.into_id_set();
        self.select_definitions(|d| tids.iter().any(|t| d.has_tag(t)))
    }

    /// Restrict to definitions with one of the given labels.
    #[must_use]
    pub fn def_lbl(mut self, labels: impl IntoIdSet) -> Self {
        self.params.def_lbl = Some(labels.into_id_set());
        self
    }

    #[must_use]
    pub fn uid(mut self, uids: impl IntoIdSet) -> Self {
        self.params.uid = Some(uids.into_id_set());
        self
    }

    #[must_use]
    pub fn eid(mut self, eids: impl IntoIdSet) -> Self {
        self.params.eid = Some(eids.into_id_set());
        self
    }

    #[must_use]
    pub fn created_after(mut self, at: Timestamp) -> Self {
        self.params.created_after = Some(at);
        self
    }

    #[must_use]
    pub fn created_before(mut self, at: Timestamp) -> Self {
        self.params.created_before = Some(at);
        self
    }

    #[must_use]
    pub fn updated_after(mut self, at: Timestamp) -> Self {
        self.params.updated_after = Some(at);
        self
    }

    #[must_use]
    pub fn updated_before(mut self, at: Timestamp) -> Self {
        self.params.updated_before = Some(at);
        self
    }

    /// Inclusive lower period bound. Malformed periods are rejected.
    #[must_use]
    pub fn from(mut self, period: impl Into<String>) -> Self {
        let period = Period::new(period);
        if let Err(err) = period.decode() {
            return self.fail(err);
        }
        self.params.from = Some(period);
        self
    }

    /// Inclusive upper period bound. Malformed periods are rejected.
    #[must_use]
    pub fn to(mut self, period: impl Into<String>) -> Self {
        let period = Period::new(period);
        if let Err(err) = period.decode() {
            return self.fail(err);
        }
        self.params.to = Some(period);
        self
    }

    /// Restrict to definitions at exactly one of the given scopes.
    #[must_use]
    pub fn scope(self, scopes: impl IntoIterator<Item = Scope>) -> Self {
        let scopes: BTreeSet<Scope> = scopes.into_iter().collect();
        self.select_definitions(|d| scopes.contains(&d.scope))
    }

    /// Restrict to definitions at `scope` or coarser.
    #[must_use]
    pub fn scope_min(self, scope: Scope) -> Self {
        self.scope(scope.at_least())
    }

    /// Restrict to definitions at `scope` or finer.
    #[must_use]
    pub fn scope_max(self, scope: Scope) -> Self {
        self.scope(scope.at_most())
    }

    /// Aggregate the result at `scope`.
    #[must_use]
    pub fn rollup(mut self, scope: Scope) -> Self {
        self.params.rollup = Some(scope);
        self
    }

    /// Allow a query without any filter.
    #[must_use]
    pub fn all_on_purpose(mut self) -> Self {
        self.params.all_on_purpose = true;
        self
    }

    /// Sort the result by a named field, ascending.
    #[must_use]
    pub fn sort_by(self, field: &str) -> Self {
        self.sort(field, false)
    }

    /// Sort the result by a named field, descending.
    #[must_use]
    pub fn sort_by_desc(self, field: &str) -> Self {
        self.sort(field, true)
    }

    fn sort(mut self, field: &str, descending: bool) -> Self {
        match field.parse::<SortField>() {
            Ok(field) => {
                self.sort = Some((field, descending));
                self
            }
            Err(err) => self.fail(err),
        }
    }

    /// Validate, query the connector, sort and optionally roll up.
    pub fn run(self) -> Result<QueryOutput, JournalError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.params.validate()?;

        let mut entries = self.connector.query(&self.params)?;
        if let Some((field, descending)) = self.sort {
            entries.sort_by(|a, b| {
                let order = field.compare(a, b);
                if descending { order.reverse() } else { order }
            });
        }

        let rollup = match self.params.rollup {
            Some(scope) => Some(summarize(&entries, &self.connector.get_defs()?, scope)?),
            None => None,
        };

        Ok(QueryOutput { entries, rollup })
    }
}

// =============================================================================
// TESTS
// =============================================================================
