//! Weekly signup cohorts.
//!
//! Players are grouped by the calendar week (Monday to Sunday) of their
//! signup. A player's cohort age is the number of week boundaries between the
//! signup week and the week of their last activity. The matrix cell for
//! signup week `w` and age `a` is the share of the week-`w` cohort whose last
//! activity fell `a` weeks after signup.
//!
//! Records whose last activity precedes their signup week have a negative
//! age; they are dropped before aggregation and counted in
//! [`CohortMatrix::dropped_records`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike as _, Days, NaiveDate};
use gamelytics_data::FilteredView;
use gamelytics_stats::descriptive::ratio_or_zero;
use serde::Serialize;

use crate::AnalysisError;

/// Maximum number of age columns in the matrix.
pub const MAX_COHORT_AGES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMatrix {
    /// Monday of each signup week, ascending. One row per week.
    pub signup_weeks: Vec<NaiveDate>,
    /// Cohort ages in weeks, ascending. One column per age.
    pub ages: Vec<u32>,
    /// Distinct players per signup week.
    pub cohort_sizes: Vec<usize>,
    /// Distinct players per (week, age) cell.
    pub counts: Vec<Vec<usize>>,
    /// `counts` normalized by cohort size, in `[0, 100]`.
    pub retention_pct: Vec<Vec<f64>>,
    /// Records discarded for having a negative cohort age.
    pub dropped_records: usize,
}

/// Monday of the week containing `date`.
///
/// ```
/// # use chrono::NaiveDate;
/// # use gamelytics_analysis::cohort::week_start;
/// let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
/// ```
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Whole calendar weeks from the signup week to the last-active week.
///
/// Negative when the last activity precedes the signup week.
#[must_use]
pub fn cohort_age_weeks(signup: NaiveDate, last_active: NaiveDate) -> i64 {
    (week_start(last_active) - week_start(signup)).num_days() / 7
}

/// Builds the weekly cohort retention matrix of the view.
#[expect(clippy::cast_precision_loss)]
pub fn weekly_cohorts(view: &FilteredView<'_>) -> Result<CohortMatrix, AnalysisError> {
    if view.is_empty() {
        return Err(AnalysisError::EmptyView);
    }

    let mut dropped_records = 0;
    let mut cohorts: BTreeMap<NaiveDate, BTreeSet<u64>> = BTreeMap::new();
    let mut cells: BTreeMap<(NaiveDate, u32), BTreeSet<u64>> = BTreeMap::new();
    let mut ages = BTreeSet::new();

    for record in view {
        let Ok(age) = u32::try_from(cohort_age_weeks(record.signup_date, record.last_active_date))
        else {
            dropped_records += 1;
            continue;
        };
        let week = week_start(record.signup_date);
        cohorts.entry(week).or_default().insert(record.player_id);
        cells
            .entry((week, age))
            .or_default()
            .insert(record.player_id);
        ages.insert(age);
    }

    if dropped_records > 0 {
        log::debug!("Dropped {dropped_records} records with last activity before signup week");
    }
    if cohorts.is_empty() {
        return Err(AnalysisError::EmptyView);
    }

    let ages = ages.into_iter().take(MAX_COHORT_AGES).collect::<Vec<_>>();
    let signup_weeks = cohorts.keys().copied().collect::<Vec<_>>();
    let cohort_sizes = cohorts.values().map(BTreeSet::len).collect::<Vec<_>>();

    let counts = signup_weeks
        .iter()
        .map(|week| {
            ages.iter()
                .map(|age| cells.get(&(*week, *age)).map_or(0, BTreeSet::len))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let retention_pct = counts
        .iter()
        .zip(&cohort_sizes)
        .map(|(row, &size)| {
            row.iter()
                .map(|&count| ratio_or_zero(count as f64, size as f64) * 100.0)
                .collect()
        })
        .collect();

    Ok(CohortMatrix {
        signup_weeks,
        ages,
        cohort_sizes,
        counts,
        retention_pct,
        dropped_records,
    })
}
