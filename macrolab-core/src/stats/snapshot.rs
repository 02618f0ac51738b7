//! Latest-observation statistics: percentile gauge and z-score readings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::descriptive::{percentile_rank, window_stats, z_score, Window, WindowStats};
use crate::domain::TimeSeries;
use crate::error::StatsError;

/// Which statistic a [`StatSnapshot`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    /// Percentile rank, 0–100.
    Percentile,
    /// Standard score.
    ZScore,
}

/// Where the latest value sits relative to its trailing window.
///
/// Carries either a percentile rank or a z-score in `statistic_value`,
/// together with the window's summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub series_key: String,
    pub kind: StatisticKind,
    pub date: NaiveDate,
    pub current_value: f64,
    pub statistic_value: f64,
    pub window_mean: f64,
    pub window_std: f64,
    pub window_min: f64,
    pub window_max: f64,
    pub window_len: usize,
}

fn latest_window(
    series: &TimeSeries,
    window: Window,
    operation: &'static str,
) -> Result<(NaiveDate, f64, WindowStats, Vec<f64>), StatsError> {
    let latest = *series
        .latest()
        .ok_or_else(|| StatsError::insufficient(operation, 1, 0))?;
    let values = series.values();
    let slice = window.apply(&values)?.to_vec();
    let stats = window_stats(&slice)?;
    Ok((latest.date, latest.value, stats, slice))
}

fn snapshot(
    series: &TimeSeries,
    kind: StatisticKind,
    date: NaiveDate,
    current_value: f64,
    statistic_value: f64,
    stats: WindowStats,
) -> StatSnapshot {
    StatSnapshot {
        series_key: series.key().to_string(),
        kind,
        date,
        current_value,
        statistic_value,
        window_mean: stats.mean,
        window_std: stats.std,
        window_min: stats.min,
        window_max: stats.max,
        window_len: stats.count,
    }
}

/// Percentile rank of the latest value within its trailing window.
///
/// The window includes the latest value itself.
pub fn percentile_snapshot(series: &TimeSeries, window: Window) -> Result<StatSnapshot, StatsError> {
    let (date, current, stats, values) = latest_window(series, window, "percentile_snapshot")?;
    let rank = percentile_rank(current, &values);
    Ok(snapshot(series, StatisticKind::Percentile, date, current, rank, stats))
}

/// Z-score of the latest value against its trailing window.
pub fn zscore_snapshot(series: &TimeSeries, window: Window) -> Result<StatSnapshot, StatsError> {
    let (date, current, stats, _) = latest_window(series, window, "zscore_snapshot")?;
    let z = z_score(current, stats.mean, stats.std);
    Ok(snapshot(series, StatisticKind::ZScore, date, current, z, stats))
}

/// Z-score of every observation against its own trailing window.
///
/// For `Window::All` each point is scored against all points up to and
/// including itself. A constant series scores 0 everywhere.
pub fn rolling_zscores(
    series: &TimeSeries,
    window: Window,
) -> Result<Vec<(NaiveDate, f64)>, StatsError> {
    let values = series.values();
    let mut out = Vec::with_capacity(values.len());
    for (i, point) in series.points().iter().enumerate() {
        let slice = window.apply(&values[..=i])?;
        let stats = window_stats(slice)?;
        out.push((point.date, z_score(point.value, stats.mean, stats.std)));
    }
    Ok(out)
}

/// Coarse bucket of a percentile rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileZone {
    ExtremeLow,
    Low,
    Neutral,
    High,
    ExtremeHigh,
}

impl PercentileZone {
    pub fn classify(percentile: f64) -> Self {
        if percentile < 10.0 {
            PercentileZone::ExtremeLow
        } else if percentile < 25.0 {
            PercentileZone::Low
        } else if percentile > 90.0 {
            PercentileZone::ExtremeHigh
        } else if percentile > 75.0 {
            PercentileZone::High
        } else {
            PercentileZone::Neutral
        }
    }

    pub fn is_extreme(self) -> bool {
        matches!(self, PercentileZone::ExtremeLow | PercentileZone::ExtremeHigh)
    }
}

/// Coarse bucket of a z-score magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreBand {
    /// Within one standard deviation.
    Normal,
    /// Between one and two.
    Elevated,
    /// Two or more.
    Extreme,
}

impl ZScoreBand {
    pub fn classify(z: f64) -> Self {
        let abs = z.abs();
        if abs < 1.0 {
            ZScoreBand::Normal
        } else if abs < 2.0 {
            ZScoreBand::Elevated
        } else {
            ZScoreBand::Extreme
        }
    }
}
