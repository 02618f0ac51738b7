//! Short-horizon trend readings: period-over-period change and last-step change.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::descriptive::mean;
use crate::domain::{Direction, TimeSeries};

/// Percent change beyond which a period-over-period move counts as a trend.
pub const PERIOD_TREND_THRESHOLD_PCT: f64 = 2.0;

/// Absolute change at or below which the last step counts as flat.
pub const LATEST_CHANGE_FLAT_BAND: f64 = 0.01;

/// Recent-period mean compared with the period before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodTrend {
    pub recent_mean: f64,
    pub prior_mean: f64,
    /// Change of the recent mean relative to `|prior_mean|`, in percent.
    pub change_pct: f64,
    pub direction: Direction,
}

/// Compare the mean of the last `period` values with the `period` before.
///
/// Returns `None` when `period` is zero or fewer than `period + 1` values
/// exist. A prior window shorter than `period` is still used. A zero prior
/// mean yields a 0% change.
pub fn period_trend(values: &[f64], period: usize) -> Option<PeriodTrend> {
    if period == 0 || values.len() <= period {
        return None;
    }
    let split = values.len() - period;
    let recent = &values[split..];
    let prior = &values[split.saturating_sub(period)..split];

    let recent_mean = mean(recent);
    let prior_mean = mean(prior);
    let change_pct = if prior_mean != 0.0 {
        (recent_mean - prior_mean) / prior_mean.abs() * 100.0
    } else {
        0.0
    };

    Some(PeriodTrend {
        recent_mean,
        prior_mean,
        change_pct,
        direction: Direction::from_delta(change_pct, PERIOD_TREND_THRESHOLD_PCT),
    })
}

/// Last observation against the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestChange {
    pub date: NaiveDate,
    pub value: f64,
    pub previous: f64,
    pub change: f64,
    pub direction: Direction,
}

/// Change between the last two observations; `None` below two points.
pub fn latest_change(series: &TimeSeries) -> Option<LatestChange> {
    let points = series.points();
    let [.., prev, last] = points else {
        return None;
    };
    let change = last.value - prev.value;
    Some(LatestChange {
        date: last.date,
        value: last.value,
        previous: prev.value,
        change,
        direction: Direction::from_delta(change, LATEST_CHANGE_FLAT_BAND),
    })
}
