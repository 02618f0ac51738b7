//! Alert scan over the latest observation of each series.
//!
//! Three independent checks run per series and their alerts are unioned:
//! extreme percentile within the recent window, a large single-step change
//! relative to the window's standard deviation, and a sustained run of
//! same-direction steps. Series shorter than [`MIN_SCAN_POINTS`] are skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Direction, TimeSeries};
use crate::error::StatsError;
use crate::stats::descriptive::{percentile_rank, population_std_dev};

/// Fewest observations for a series to be scanned at all.
pub const MIN_SCAN_POINTS: usize = 12;

/// Default trailing window for the percentile and deviation checks.
pub const DEFAULT_RECENT_WINDOW: usize = 60;

// ── Thresholds ──

const EXTREME_HIGH_PCT: f64 = 90.0;
const EXTREME_HIGH_SEVERE_PCT: f64 = 95.0;
const EXTREME_LOW_PCT: f64 = 10.0;
const EXTREME_LOW_SEVERE_PCT: f64 = 5.0;
const DEVIATION_SIGMA: f64 = 1.5;
const DEVIATION_SEVERE_SIGMA: f64 = 2.5;
const TREND_STEPS: usize = 4;
const TREND_SEVERE_STEPS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ExtremeHigh,
    ExtremeLow,
    LargeDeviation,
    SustainedTrend,
}

impl AlertKind {
    /// Same name the serialized form uses.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::ExtremeHigh => "extreme_high",
            AlertKind::ExtremeLow => "extreme_low",
            AlertKind::LargeDeviation => "large_deviation",
            AlertKind::SustainedTrend => "sustained_trend",
        }
    }
}

/// Alert severity. Orders `High` before `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

/// The measurement behind an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertAuxiliary {
    Percentile { percentile: f64 },
    Change { change: f64, sigma_multiple: f64 },
    ConsecutiveSteps { steps: usize, direction: Direction },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub series_key: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    /// Latest value of the series.
    pub value: f64,
    pub date: NaiveDate,
    pub auxiliary: Option<AlertAuxiliary>,
}

/// Length and direction of the trailing run of same-direction steps.
///
/// Counts backwards from the last step while each step moves the same way.
/// A flat last step yields `(1, Flat)`; fewer than two values `(0, Flat)`.
pub fn consecutive_run(values: &[f64]) -> (usize, Direction) {
    let step = |i: usize| Direction::from_delta(values[i] - values[i - 1], 0.0);
    let n = values.len();
    if n < 2 {
        return (0, Direction::Flat);
    }
    let direction = step(n - 1);
    if direction == Direction::Flat {
        return (1, Direction::Flat);
    }
    let run = 1 + (1..n - 1).rev().take_while(|&i| step(i) == direction).count();
    (run, direction)
}

/// Run every check on one series.
///
/// Returns alerts in discovery order (percentile, deviation, trend). Short
/// series return an empty list. `recent_window` of 0 is rejected.
pub fn scan(series: &TimeSeries, recent_window: usize) -> Result<Vec<AlertEvent>, StatsError> {
    if recent_window == 0 {
        return Err(StatsError::InvalidParameter(
            "recent window must be at least 1".into(),
        ));
    }
    let Some(latest) = series.latest().filter(|_| series.len() >= MIN_SCAN_POINTS) else {
        debug!(
            series = series.key(),
            points = series.len(),
            "skipping alert scan, too few points"
        );
        return Ok(Vec::new());
    };

    let values = series.values();
    let current = latest.value;
    let recent = &values[values.len().saturating_sub(recent_window)..];
    let event = |kind, severity, message: String, auxiliary| AlertEvent {
        series_key: series.key().to_string(),
        kind,
        severity,
        message,
        value: current,
        date: latest.date,
        auxiliary: Some(auxiliary),
    };
    let mut alerts = Vec::new();

    // Extreme percentile
    let percentile = percentile_rank(current, recent);
    if percentile > EXTREME_HIGH_PCT {
        alerts.push(event(
            AlertKind::ExtremeHigh,
            if percentile > EXTREME_HIGH_SEVERE_PCT { Severity::High } else { Severity::Medium },
            format!("at the {percentile:.0}th percentile of the last {} observations", recent.len()),
            AlertAuxiliary::Percentile { percentile },
        ));
    }
    if percentile < EXTREME_LOW_PCT {
        alerts.push(event(
            AlertKind::ExtremeLow,
            if percentile < EXTREME_LOW_SEVERE_PCT { Severity::High } else { Severity::Medium },
            format!("at the {percentile:.0}th percentile of the last {} observations", recent.len()),
            AlertAuxiliary::Percentile { percentile },
        ));
    }

    // Large single-step deviation
    let change = current - values[values.len() - 2];
    let std = population_std_dev(recent);
    if std > 0.0 && change.abs() > DEVIATION_SIGMA * std {
        let sigma_multiple = change.abs() / std;
        let verb = if change > 0.0 { "rose" } else { "fell" };
        alerts.push(event(
            AlertKind::LargeDeviation,
            if change.abs() > DEVIATION_SEVERE_SIGMA * std { Severity::High } else { Severity::Medium },
            format!("{verb} {change:+.2} in one step, {sigma_multiple:.1}σ of recent volatility"),
            AlertAuxiliary::Change { change, sigma_multiple },
        ));
    }

    // Sustained trend
    let (steps, direction) = consecutive_run(&values);
    if direction != Direction::Flat && steps >= TREND_STEPS {
        let verb = if direction == Direction::Up { "risen" } else { "fallen" };
        alerts.push(event(
            AlertKind::SustainedTrend,
            if steps >= TREND_SEVERE_STEPS { Severity::High } else { Severity::Medium },
            format!("has {verb} for {steps} consecutive observations"),
            AlertAuxiliary::ConsecutiveSteps { steps, direction },
        ));
    }

    Ok(alerts)
}

/// Stable sort: `High` first, discovery order kept within a severity.
pub fn sort_alerts(alerts: &mut [AlertEvent]) {
    alerts.sort_by_key(|a| a.severity);
}

/// Scan every series in input order and rank the union by severity.
pub fn scan_all(series: &[TimeSeries], recent_window: usize) -> Result<Vec<AlertEvent>, StatsError> {
    let mut alerts = Vec::new();
    for ts in series {
        alerts.extend(scan(ts, recent_window)?);
    }
    sort_alerts(&mut alerts);
    Ok(alerts)
}
