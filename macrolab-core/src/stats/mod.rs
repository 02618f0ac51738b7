//! Single-series descriptive statistics.
//!
//! Windowed mean/std/min/max, strict percentile rank and z-score
//! ([`descriptive`]), latest-value snapshots and classifications
//! ([`snapshot`]), and short-horizon trend readings ([`trend`]).

pub mod descriptive;
pub mod snapshot;
pub mod trend;

pub use descriptive::{
    mean, percentile_rank, population_std_dev, rolling_stats, window_stats, z_score, Window,
    WindowStats,
};
pub use snapshot::{
    percentile_snapshot, rolling_zscores, zscore_snapshot, PercentileZone, StatSnapshot,
    StatisticKind, ZScoreBand,
};
pub use trend::{latest_change, period_trend, LatestChange, PeriodTrend};

/// Build a daily series starting 2024-01-01 from raw values, for tests.
#[cfg(test)]
pub fn make_series(key: &str, values: &[f64]) -> crate::domain::TimeSeries {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    crate::domain::TimeSeries::from_pairs(
        key,
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (base + chrono::Duration::days(i as i64), v)),
    )
    .unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for statistics tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
