//! # Query Filter
//!
//! Evaluates [`QueryParams`] against entries and returns the matching
//! subset. Parameter groups combine with logical AND.
//!
//! ## Definition slot
//!
//! `did`, `defLbl` and `tag` all narrow the set of owning definitions and
//! share one internal slot. `did` and resolved `defLbl` ids are united;
//! a supplied `tag` replaces the slot with the definitions carrying any of
//! the tags.
//!
//! ## Empty queries
//!
//! A query without any discriminating parameter is rejected with
//! [`JournalError::Validation`] unless `allOnPurpose` is set. Neither
//! `includeDeleted` nor `rollup` discriminate.

use crate::model::{Definition, Entry, Journal};
use crate::scope::{Period, Scope};
use crate::standardize::{LogicalKey, same_key};
use crate::{JournalError, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

// =============================================================================
// PARAMETERS
// =============================================================================

/// How tombstoned entries are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeDeleted {
    /// Exclude tombstones.
    #[default]
    No,
    /// Include both live entries and tombstones.
    Yes,
    /// Return tombstones only.
    Only,
}

impl IncludeDeleted {
    fn admits(self, deleted: bool) -> bool {
        match self {
            Self::No => !deleted,
            Self::Yes => true,
            Self::Only => deleted,
        }
    }
}

impl FromStr for IncludeDeleted {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::standardize::standardize(s).as_str() {
            "no" | "false" => Ok(Self::No),
            "yes" | "true" => Ok(Self::Yes),
            "only" => Ok(Self::Only),
            _ => Err(JournalError::Validation(format!(
                "includeDeleted must be no, yes or only, got '{}'",
                s
            ))),
        }
    }
}

/// Structured query parameters. Every field is optional.
///
/// A set that is present but empty matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    pub include_deleted: IncludeDeleted,
    pub did: Option<BTreeSet<String>>,
    pub def_lbl: Option<BTreeSet<String>>,
    pub uid: Option<BTreeSet<String>>,
    pub eid: Option<BTreeSet<String>>,
    pub tag: Option<BTreeSet<String>>,
    /// Exclusive lower bound on `_created`.
    pub created_after: Option<Timestamp>,
    /// Exclusive upper bound on `_created`.
    pub created_before: Option<Timestamp>,
    /// Exclusive lower bound on `_updated`.
    pub updated_after: Option<Timestamp>,
    /// Exclusive upper bound on `_updated`.
    pub updated_before: Option<Timestamp>,
    /// Inclusive lower bound on `_period`.
    pub from: Option<Period>,
    /// Inclusive upper bound on `_period`.
    pub to: Option<Period>,
    pub scope: Option<BTreeSet<Scope>>,
    /// This scope and everything coarser.
    pub scope_min: Option<Scope>,
    /// This scope and everything finer.
    pub scope_max: Option<Scope>,
    /// Aggregate the result at this scope. Does not filter.
    pub rollup: Option<Scope>,
    pub all_on_purpose: bool,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A query that deliberately matches every live entry.
    #[must_use]
    pub fn all() -> Self {
        Self {
            all_on_purpose: true,
            ..Self::default()
        }
    }

    /// Check whether any parameter narrows the result.
    #[must_use]
    pub fn is_discriminating(&self) -> bool {
        self.did.is_some()
            || self.def_lbl.is_some()
            || self.uid.is_some()
            || self.eid.is_some()
            || self.tag.is_some()
            || self.created_after.is_some()
            || self.created_before.is_some()
            || self.updated_after.is_some()
            || self.updated_before.is_some()
            || self.from.is_some()
            || self.to.is_some()
            || self.scope.is_some()
            || self.scope_min.is_some()
            || self.scope_max.is_some()
    }

    /// Reject queries that would read everything by accident.
    pub fn validate(&self) -> Result<(), JournalError> {
        if !self.is_discriminating() && !self.all_on_purpose {
            return Err(JournalError::Validation(
                "empty query: supply a filter or set allOnPurpose".to_string(),
            ));
        }
        Ok(())
    }

    /// Definitions allowed by the did/defLbl/tag slot, `None` when unset.
    fn definition_slot(&self, catalog: &[Definition]) -> Option<BTreeSet<LogicalKey>> {
        if let Some(tags) = &self.tag {
            return Some(
                catalog
                    .iter()
                    .filter(|d| tags.iter().any(|t| d.has_tag(t)))
                    .map(|d| LogicalKey::new(&d.did))
                    .collect(),
            );
        }
        if self.did.is_none() && self.def_lbl.is_none() {
            return None;
        }

        let mut slot: BTreeSet<LogicalKey> = self
            .did
            .iter()
            .flatten()
            .map(|did| LogicalKey::new(did))
            .collect();
        if let Some(labels) = &self.def_lbl {
            slot.extend(
                catalog
                    .iter()
                    .filter(|d| labels.iter().any(|l| same_key(l, &d.label)))
                    .map(|d| LogicalKey::new(&d.did)),
            );
        }
        Some(slot)
    }

    /// Scopes allowed by `scope`/`scopeMin`/`scopeMax`, `None` when unset.
    fn scope_slot(&self) -> Option<BTreeSet<Scope>> {
        let ranged = (self.scope_min.is_some() || self.scope_max.is_some())
            .then(|| Scope::range(self.scope_min, self.scope_max));

        match (&self.scope, ranged) {
            (None, None) => None,
            (Some(set), None) => Some(set.clone()),
            (None, Some(range)) => Some(range.into_iter().collect()),
            (Some(set), Some(range)) => Some(range.into_iter().filter(|s| set.contains(s)).collect()),
        }
    }
}

// =============================================================================
// FILTER
// =============================================================================

/// Evaluates query parameters against entries.
pub struct QueryFilter;

impl QueryFilter {
    /// Return the entries matching `params`, in input order.
    ///
    /// `catalog` resolves labels, tags and scopes to definitions.
    pub fn filter(
        params: &QueryParams,
        entries: &[Entry],
        catalog: &[Definition],
    ) -> Result<Vec<Entry>, JournalError> {
        params.validate()?;

        let dids = params.definition_slot(catalog);
        let scoped_dids: Option<BTreeSet<LogicalKey>> = params.scope_slot().map(|scopes| {
            catalog
                .iter()
                .filter(|d| scopes.contains(&d.scope))
                .map(|d| LogicalKey::new(&d.did))
                .collect()
        });
        let eids: Option<BTreeSet<LogicalKey>> = params
            .eid
            .as_ref()
            .map(|set| set.iter().map(|e| LogicalKey::new(e)).collect());

        let matches = |entry: &Entry| -> bool {
            let did = LogicalKey::new(&entry.did);

            params.include_deleted.admits(entry.deleted)
                && dids.as_ref().is_none_or(|set| set.contains(&did))
                && scoped_dids.as_ref().is_none_or(|set| set.contains(&did))
                && eids
                    .as_ref()
                    .is_none_or(|set| set.contains(&LogicalKey::new(&entry.eid)))
                && params
                    .uid
                    .as_ref()
                    .is_none_or(|set| set.contains(entry.uid.as_str()))
                && params.created_after.is_none_or(|t| entry.created > t)
                && params.created_before.is_none_or(|t| entry.created < t)
                && params.updated_after.is_none_or(|t| entry.updated > t)
                && params.updated_before.is_none_or(|t| entry.updated < t)
                && params
                    .from
                    .as_ref()
                    .is_none_or(|from| entry.period.as_str() >= from.as_str())
                && params
                    .to
                    .as_ref()
                    .is_none_or(|to| entry.period.as_str() <= to.as_str())
        };

        Ok(entries.iter().filter(|e| matches(e)).cloned().collect())
    }

    /// Filter the current entries of a journal against its live definitions.
    pub fn run(params: &QueryParams, journal: &Journal) -> Result<Vec<Entry>, JournalError> {
        Self::filter(params, &journal.current_entries(), &journal.live_definitions())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Definition> {
        vec![
            Definition::new("mood", "Mood", Scope::Day).with_tag("health"),
            Definition::new("sleep", "Sleep Hours", Scope::Day).with_tag("health"),
            Definition::new("weight", "Weight", Scope::Week),
        ]
    }

    fn entry(eid: &str, did: &str, period: &str, t: i64) -> Entry {
        let mut e = Entry::new(eid, did, Period::new(period));
        e.created = Timestamp(t);
        e.updated = Timestamp(t);
        e
    }

    fn entries() -> Vec<Entry> {
        let mut gone = entry("e4", "mood", "2024-01-04", 40);
        gone.deleted = true;
        vec![
            entry("e1", "mood", "2024-01-01", 10),
            entry("e2", "sleep", "2024-01-02", 20),
            entry("e3", "weight", "2024-W01", 30),
            gone,
        ]
    }

    fn eids(result: &[Entry]) -> Vec<&str> {
        result.iter().map(|e| e.eid.as_str()).collect()
    }

    fn set(items: &[&str]) -> Option<BTreeSet<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn empty_query_is_rejected() {
        let err = QueryFilter::filter(&QueryParams::new(), &entries(), &catalog());
        assert!(matches!(err, Err(JournalError::Validation(_))));

        let only_deleted = QueryParams {
            include_deleted: IncludeDeleted::Only,
            rollup: Some(Scope::Week),
            ..QueryParams::default()
        };
        assert!(QueryFilter::filter(&only_deleted, &entries(), &catalog()).is_err());
    }

    #[test]
    fn all_on_purpose_returns_live_entries() {
        let result = QueryFilter::filter(&QueryParams::all(), &entries(), &catalog())
            .expect("query");
        assert_eq!(eids(&result), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn include_deleted_modes() {
        let mut params = QueryParams::all();
        params.include_deleted = IncludeDeleted::Only;
        let only = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(eids(&only), vec!["e4"]);

        params.include_deleted = IncludeDeleted::Yes;
        let both = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(both.len(), 4);
    }

    #[test]
    fn did_and_label_are_united() {
        let params = QueryParams {
            did: set(&["mood"]),
            def_lbl: set(&["sleep hours"]),
            ..QueryParams::default()
        };
        let result = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(eids(&result), vec!["e1", "e2"]);
    }

    #[test]
    fn tag_replaces_did_slot() {
        let params = QueryParams {
            did: set(&["weight"]),
            tag: set(&["health"]),
            ..QueryParams::default()
        };
        let result = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(eids(&result), vec!["e1", "e2"]);
    }

    #[test]
    fn empty_set_matches_nothing() {
        let params = QueryParams {
            eid: Some(BTreeSet::new()),
            ..QueryParams::default()
        };
        let result = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert!(result.is_empty());
    }

    #[test]
    fn timestamp_bounds_are_exclusive() {
        let params = QueryParams {
            created_after: Some(Timestamp(10)),
            created_before: Some(Timestamp(30)),
            ..QueryParams::default()
        };
        let result = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(eids(&result), vec!["e2"]);
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let params = QueryParams {
            from: Some(Period::new("2024-01-01")),
            to: Some(Period::new("2024-01-02")),
            ..QueryParams::default()
        };
        let result = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(eids(&result), vec!["e1", "e2"]);
    }

    #[test]
    fn scope_min_keeps_coarser_definitions() {
        let params = QueryParams {
            scope_min: Some(Scope::Week),
            ..QueryParams::default()
        };
        let result = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(eids(&result), vec!["e3"]);
    }

    #[test]
    fn scope_set_intersects_range() {
        let params = QueryParams {
            scope: Some([Scope::Day, Scope::Week].into_iter().collect()),
            scope_max: Some(Scope::Day),
            ..QueryParams::default()
        };
        let result = QueryFilter::filter(&params, &entries(), &catalog()).expect("query");
        assert_eq!(eids(&result), vec!["e1", "e2"]);
    }

    #[test]
    fn params_parse_from_camel_case_json() {
        let params: QueryParams = serde_json::from_str(
            r#"{"includeDeleted": "only", "defLbl": ["Mood"], "scopeMin": "week"}"#,
        )
        .expect("parse");
        assert_eq!(params.include_deleted, IncludeDeleted::Only);
        assert_eq!(params.scope_min, Some(Scope::Week));
        assert!(params.is_discriminating());
    }
}
