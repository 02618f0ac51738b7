//! Multi-series date alignment.
//!
//! Given several series, build a common ascending date axis. In
//! intersection mode only dates present in every series survive; in union
//! mode every date survives and missing values are `None` (no forward-fill).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::TimeSeries;
use crate::error::StatsError;

/// Fewest aligned dates for which correlation or regression is defined.
pub const MIN_ALIGNED_POINTS: usize = 3;

/// How dates absent from some series are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    /// Keep only dates present in every series.
    #[default]
    Intersection,
    /// Keep every date; missing values become `None`.
    Union,
}

/// Several series reduced to one date axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeriesSet {
    pub mode: AlignMode,
    /// The common date axis (sorted ascending, unique).
    pub dates: Vec<NaiveDate>,
    /// Series keys in input order.
    pub keys: Vec<String>,
    /// One column per key, each the same length as `dates`.
    pub columns: Vec<Vec<Option<f64>>>,
}

impl AlignedSeriesSet {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Column for `key`, if that key was aligned.
    pub fn column(&self, key: &str) -> Option<&[Option<f64>]> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|i| self.columns[i].as_slice())
    }

    /// Column `index` with gaps removed. In intersection mode nothing is removed.
    pub fn present_values(&self, index: usize) -> Vec<f64> {
        self.columns
            .get(index)
            .map(|col| col.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}

/// Align series onto a common date axis.
///
/// Fails with `InsufficientData` when fewer than [`MIN_ALIGNED_POINTS`]
/// dates survive.
pub fn align(series: &[&TimeSeries], mode: AlignMode) -> Result<AlignedSeriesSet, StatsError> {
    let aligned = align_unchecked(series, mode);
    if aligned.len() < MIN_ALIGNED_POINTS {
        return Err(StatsError::insufficient(
            "align",
            MIN_ALIGNED_POINTS,
            aligned.len(),
        ));
    }
    Ok(aligned)
}

/// Alignment without the minimum-size check, for callers that turn a short
/// overlap into a sentinel result rather than an error.
pub(crate) fn align_unchecked(series: &[&TimeSeries], mode: AlignMode) -> AlignedSeriesSet {
    let mut all_dates = BTreeSet::new();
    for ts in series {
        for point in ts.points() {
            all_dates.insert(point.date);
        }
    }

    // Build a lookup per series: date → value
    let lookups: Vec<HashMap<NaiveDate, f64>> = series
        .iter()
        .map(|ts| ts.points().iter().map(|p| (p.date, p.value)).collect())
        .collect();

    let dates: Vec<NaiveDate> = match mode {
        AlignMode::Union => all_dates.into_iter().collect(),
        AlignMode::Intersection => all_dates
            .into_iter()
            .filter(|date| !lookups.is_empty() && lookups.iter().all(|m| m.contains_key(date)))
            .collect(),
    };

    let columns = lookups
        .iter()
        .map(|lookup| dates.iter().map(|date| lookup.get(date).copied()).collect())
        .collect();

    AlignedSeriesSet {
        mode,
        dates,
        keys: series.iter().map(|ts| ts.key().to_string()).collect(),
        columns,
    }
}

/// Values of two series on their common dates, in date order.
pub(crate) fn paired_values(a: &TimeSeries, b: &TimeSeries) -> (Vec<f64>, Vec<f64>) {
    let aligned = align_unchecked(&[a, b], AlignMode::Intersection);
    (aligned.present_values(0), aligned.present_values(1))
}
