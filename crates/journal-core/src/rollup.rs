//! # Rollup
//!
//! Groups entries into coarser period buckets and aggregates each point per
//! its definition's rollup strategy.
//!
//! Output shape: `period -> did -> pid -> Aggregate`. Ids that differ only
//! in case or punctuation share a bucket, named as the catalog spells them.
//!
//! Within a bucket, values are taken in `(period, _created, _eid)` order so
//! that `first` and `last` are deterministic. Points without a point
//! definition are counted.

use crate::model::{Definition, Entry, PointValue, RollupStrategy};
use crate::scope::{Period, Scope};
use crate::standardize::LogicalKey;
use crate::JournalError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The aggregate of one point inside one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub strategy: RollupStrategy,
    /// Number of values that fell into the bucket.
    pub samples: usize,
    /// `None` when the strategy needs numbers and no sample was numeric.
    pub value: Option<PointValue>,
}

impl Aggregate {
    fn compute(strategy: RollupStrategy, values: &[PointValue]) -> Self {
        let numbers = || values.iter().filter_map(PointValue::as_number);
        let value = match strategy {
            RollupStrategy::Count => Some(PointValue::Number(values.len() as f64)),
            RollupStrategy::CountDistinct => {
                let distinct: BTreeSet<String> = values.iter().map(ToString::to_string).collect();
                Some(PointValue::Number(distinct.len() as f64))
            }
            RollupStrategy::Sum => numbers()
                .reduce(|a, b| a + b)
                .map(PointValue::Number),
            RollupStrategy::Average => {
                let count = numbers().count();
                (count > 0).then(|| PointValue::Number(numbers().sum::<f64>() / count as f64))
            }
            RollupStrategy::Min => numbers().reduce(f64::min).map(PointValue::Number),
            RollupStrategy::Max => numbers().reduce(f64::max).map(PointValue::Number),
            RollupStrategy::First => values.first().cloned(),
            RollupStrategy::Last => values.last().cloned(),
        };

        Self {
            strategy,
            samples: values.len(),
            value,
        }
    }
}

/// Aggregated points per bucket period, definition and point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rollup {
    pub buckets: BTreeMap<Period, BTreeMap<String, BTreeMap<String, Aggregate>>>,
}

impl Rollup {
    /// Look up one aggregate.
    #[must_use]
    pub fn get(&self, period: &str, did: &str, pid: &str) -> Option<&Aggregate> {
        self.buckets
            .get(&Period::new(period))?
            .get(did)?
            .get(pid)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of bucket periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }
}

type Samples = BTreeMap<Period, BTreeMap<String, BTreeMap<String, Vec<PointValue>>>>;

/// Roll `entries` up to `scope`.
///
/// Entries whose period is malformed fail the whole rollup with a
/// validation error. Deleted points are skipped.
pub fn summarize(
    entries: &[Entry],
    catalog: &[Definition],
    scope: Scope,
) -> Result<Rollup, JournalError> {
    let definitions: BTreeMap<LogicalKey, &Definition> = catalog
        .iter()
        .map(|d| (LogicalKey::new(&d.did), d))
        .collect();

    let mut ordered: Vec<&Entry> = entries.iter().collect();
    ordered.sort_by(|a, b| {
        (&a.period, a.created, &a.eid).cmp(&(&b.period, b.created, &b.eid))
    });

    // Bucket names: the catalog's spelling, else the first one seen.
    let mut dids: BTreeMap<LogicalKey, String> = catalog
        .iter()
        .map(|d| (LogicalKey::new(&d.did), d.did.clone()))
        .collect();
    let mut pids: BTreeMap<(LogicalKey, LogicalKey), String> = catalog
        .iter()
        .flat_map(|d| {
            d.points
                .live()
                .map(move |p| ((LogicalKey::new(&d.did), LogicalKey::new(&p.pid)), p.pid.clone()))
        })
        .collect();

    let mut samples = Samples::new();
    for entry in ordered {
        let bucket = entry.period.rollup_to(scope)?;
        let did_key = LogicalKey::new(&entry.did);
        let did = dids
            .entry(did_key.clone())
            .or_insert_with(|| entry.did.clone())
            .clone();
        let points = samples.entry(bucket).or_default().entry(did).or_default();
        for point in entry.points.live() {
            let pid = pids
                .entry((did_key.clone(), LogicalKey::new(&point.pid)))
                .or_insert_with(|| point.pid.clone())
                .clone();
            points.entry(pid).or_default().push(point.value.clone());
        }
    }

    let buckets = samples
        .into_iter()
        .map(|(period, by_did)| {
            let by_did = by_did
                .into_iter()
                .map(|(did, by_pid)| {
                    let definition = definitions.get(&LogicalKey::new(&did));
                    let by_pid = by_pid
                        .into_iter()
                        .map(|(pid, values)| {
                            let strategy = definition
                                .and_then(|d| d.point(&pid))
                                .map(|p| p.effective_rollup())
                                .unwrap_or(RollupStrategy::Count);
                            (pid, Aggregate::compute(strategy, &values))
                        })
                        .collect();
                    (did, by_pid)
                })
                .collect();
            (period, by_did)
        })
        .collect();

    Ok(Rollup { buckets })
}

// =============================================================================
// TESTS
// =============================================================================
