//! # Scopes and Periods
//!
//! A `Scope` is the time granularity of a Definition. Scopes are totally
//! ordered from finest to coarsest:
//!
//! `second < minute < hour < day < week < month < quarter < year`
//!
//! A `Period` is the string naming the time bucket an Entry belongs to.
//! Each scope has one fixed period shape, chosen so that plain string
//! comparison orders periods of the same scope chronologically:
//!
//! | Scope   | Shape                  | Example               |
//! |---------|------------------------|-----------------------|
//! | second  | `YYYY-MM-DDTHH:MM:SS`  | `2024-03-09T07:05:00` |
//! | minute  | `YYYY-MM-DDTHH:MM`     | `2024-03-09T07:05`    |
//! | hour    | `YYYY-MM-DDTHH`        | `2024-03-09T07`       |
//! | day     | `YYYY-MM-DD`           | `2024-03-09`          |
//! | week    | `YYYY-Www` (ISO week)  | `2024-W10`            |
//! | month   | `YYYY-MM`              | `2024-03`             |
//! | quarter | `YYYY-Qn`              | `2024-Q1`             |
//! | year    | `YYYY`                 | `2024`                |

use crate::JournalError;
use crate::standardize::standardize;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SCOPE
// =============================================================================

/// Time granularity, ordered from finest to coarsest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Second,
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Scope {
    /// Every scope, finest first.
    pub const ALL: [Scope; 8] = [
        Scope::Second,
        Scope::Minute,
        Scope::Hour,
        Scope::Day,
        Scope::Week,
        Scope::Month,
        Scope::Quarter,
        Scope::Year,
    ];

    /// The lowercase name of this scope.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// This scope and every coarser one.
    #[must_use]
    pub fn at_least(self) -> Vec<Scope> {
        Self::ALL.into_iter().filter(|s| *s >= self).collect()
    }

    /// This scope and every finer one.
    #[must_use]
    pub fn at_most(self) -> Vec<Scope> {
        Self::ALL.into_iter().filter(|s| *s <= self).collect()
    }

    /// Scopes within `[min, max]`, either bound optional.
    #[must_use]
    pub fn range(min: Option<Scope>, max: Option<Scope>) -> Vec<Scope> {
        Self::ALL
            .into_iter()
            .filter(|s| min.is_none_or(|m| *s >= m) && max.is_none_or(|m| *s <= m))
            .collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scope {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = standardize(s);
        Self::ALL
            .into_iter()
            .find(|scope| scope.name() == key || format!("{}s", scope.name()) == key)
            .ok_or_else(|| JournalError::Validation(format!("unknown scope '{}'", s)))
    }
}

// =============================================================================
// PERIOD
// =============================================================================

/// The time bucket an Entry belongs to, at its Definition's scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub String);

impl Period {
    /// Wrap a period string without checking its shape.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Format the period containing `at` for the given scope.
    #[must_use]
    pub fn at(scope: Scope, at: NaiveDateTime) -> Self {
        let text = match scope {
            Scope::Second => at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Scope::Minute => at.format("%Y-%m-%dT%H:%M").to_string(),
            Scope::Hour => at.format("%Y-%m-%dT%H").to_string(),
            Scope::Day => at.format("%Y-%m-%d").to_string(),
            Scope::Week => {
                let week = at.date().iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Scope::Month => at.format("%Y-%m").to_string(),
            Scope::Quarter => format!("{:04}-Q{}", at.year(), at.month0() / 3 + 1),
            Scope::Year => format!("{:04}", at.year()),
        };
        Self(text)
    }

    /// Get the period as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scope implied by this period's shape, if it has a known shape.
    #[must_use]
    pub fn scope(&self) -> Option<Scope> {
        decode(&self.0).map(|(scope, _)| scope)
    }

    /// Decode the period into its scope and the instant it starts at.
    pub fn decode(&self) -> Result<(Scope, NaiveDateTime), JournalError> {
        decode(&self.0)
            .ok_or_else(|| JournalError::Validation(format!("malformed period '{}'", self.0)))
    }

    /// Map this period to the bucket containing it at `target` scope.
    ///
    /// Targets finer than or equal to the period's own scope leave it
    /// unchanged.
    pub fn rollup_to(&self, target: Scope) -> Result<Period, JournalError> {
        let (scope, start) = self.decode()?;
        if target <= scope {
            return Ok(self.clone());
        }
        Ok(Self::at(target, start))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a fixed-width run of ASCII digits.
fn digits<T: FromStr>(field: &str, width: usize) -> Option<T> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn decode(text: &str) -> Option<(Scope, NaiveDateTime)> {
    if let Some((date_part, time_part)) = text.split_once('T') {
        let date = decode_ymd(date_part)?;
        let fields = time_part
            .split(':')
            .map(|f| digits::<u32>(f, 2))
            .collect::<Option<Vec<_>>>()?;
        let (scope, h, m, s) = match fields.as_slice() {
            [h] => (Scope::Hour, *h, 0, 0),
            [h, m] => (Scope::Minute, *h, *m, 0),
            [h, m, s] => (Scope::Second, *h, *m, *s),
            _ => return None,
        };
        return Some((scope, date.and_hms_opt(h, m, s)?));
    }

    let parts: Vec<&str> = text.split('-').collect();
    let (scope, date) = match parts.as_slice() {
        [y] => (Scope::Year, NaiveDate::from_ymd_opt(digits(y, 4)?, 1, 1)?),
        [y, q] if q.starts_with('Q') => {
            let quarter: u32 = digits(&q[1..], 1)?;
            if !(1..=4).contains(&quarter) {
                return None;
            }
            let month = (quarter - 1) * 3 + 1;
            (
                Scope::Quarter,
                NaiveDate::from_ymd_opt(digits(y, 4)?, month, 1)?,
            )
        }
        [y, w] if w.starts_with('W') => (
            Scope::Week,
            NaiveDate::from_isoywd_opt(digits(y, 4)?, digits(&w[1..], 2)?, Weekday::Mon)?,
        ),
        [y, m] => (
            Scope::Month,
            NaiveDate::from_ymd_opt(digits(y, 4)?, digits(m, 2)?, 1)?,
        ),
        [_, _, _] => (Scope::Day, decode_ymd(text)?),
        _ => return None,
    };
    Some((scope, date.and_hms_opt(0, 0, 0)?))
}

fn decode_ymd(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split('-').collect();
    match parts.as_slice() {
        [y, m, d] => NaiveDate::from_ymd_opt(digits(y, 4)?, digits(m, 2)?, digits(d, 2)?),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_are_ordered_fine_to_coarse() {
        assert!(Scope::Second < Scope::Minute);
        assert!(Scope::Week < Scope::Month);
        assert!(Scope::Quarter < Scope::Year);
    }

    #[test]
    fn at_least_week_excludes_day() {
        let coarse = Scope::Week.at_least();
        assert_eq!(
            coarse,
            vec![Scope::Week, Scope::Month, Scope::Quarter, Scope::Year]
        );
        assert!(!coarse.contains(&Scope::Day));
    }

    #[test]
    fn at_most_hour_is_finer_side() {
        assert_eq!(
            Scope::Hour.at_most(),
            vec![Scope::Second, Scope::Minute, Scope::Hour]
        );
    }

    #[test]
    fn range_intersects_bounds() {
        assert_eq!(
            Scope::range(Some(Scope::Day), Some(Scope::Month)),
            vec![Scope::Day, Scope::Week, Scope::Month]
        );
        assert_eq!(Scope::range(None, None).len(), 8);
    }

    #[test]
    fn scope_parses_loosely() {
        assert_eq!("Week".parse::<Scope>().expect("parse"), Scope::Week);
        assert_eq!("QUARTERS".parse::<Scope>().expect("parse"), Scope::Quarter);
        assert!("fortnight".parse::<Scope>().is_err());
    }

    #[test]
    fn period_shapes_decode_to_their_scope() {
        let cases = [
            ("2024-03-09T07:05:00", Scope::Second),
            ("2024-03-09T07:05", Scope::Minute),
            ("2024-03-09T07", Scope::Hour),
            ("2024-03-09", Scope::Day),
            ("2024-W10", Scope::Week),
            ("2024-03", Scope::Month),
            ("2024-Q1", Scope::Quarter),
            ("2024", Scope::Year),
        ];
        for (text, scope) in cases {
            assert_eq!(Period::new(text).scope(), Some(scope), "{}", text);
        }
    }

    #[test]
    fn malformed_periods_are_rejected() {
        for text in ["", "24-03-09", "2024-13", "2024-Q5", "2024-W60", "2024-03-09T7"] {
            assert!(Period::new(text).decode().is_err(), "{}", text);
        }
    }

    #[test]
    fn days_roll_up_into_iso_weeks() {
        // 2024-03-09 is a Saturday in ISO week 10.
        let week = Period::new("2024-03-09").rollup_to(Scope::Week).expect("rollup");
        assert_eq!(week.as_str(), "2024-W10");

        // 2021-01-01 belongs to the last ISO week of 2020.
        let week = Period::new("2021-01-01").rollup_to(Scope::Week).expect("rollup");
        assert_eq!(week.as_str(), "2020-W53");
    }

    #[test]
    fn coarser_targets_map_to_containing_bucket() {
        let p = Period::new("2024-08-15T10:30");
        assert_eq!(p.rollup_to(Scope::Day).expect("day").as_str(), "2024-08-15");
        assert_eq!(p.rollup_to(Scope::Month).expect("month").as_str(), "2024-08");
        assert_eq!(p.rollup_to(Scope::Quarter).expect("q").as_str(), "2024-Q3");
        assert_eq!(p.rollup_to(Scope::Year).expect("year").as_str(), "2024");
    }

    #[test]
    fn finer_target_leaves_period_unchanged() {
        let p = Period::new("2024-05");
        assert_eq!(p.rollup_to(Scope::Day).expect("rollup"), p);
    }

    #[test]
    fn lexical_order_matches_time_order_within_scope() {
        let mut periods = vec![
            Period::new("2024-W10"),
            Period::new("2023-W52"),
            Period::new("2024-W02"),
        ];
        periods.sort();
        let texts: Vec<_> = periods.iter().map(Period::as_str).collect();
        assert_eq!(texts, vec!["2023-W52", "2024-W02", "2024-W10"]);
    }
}
