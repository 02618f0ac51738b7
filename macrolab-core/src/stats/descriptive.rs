//! Windowed descriptive statistics for a single series.
//!
//! Standard deviation is the population form (divide by N), matching the
//! dashboards that consume these numbers. Percentile rank is a strict
//! less-than rank: ties with the current value are excluded from the
//! numerator, so a constant window ranks 0 and a unique maximum of `n`
//! values ranks `100·(n−1)/n`.

use serde::{Deserialize, Serialize};

use crate::domain::TimeSeries;
use crate::error::StatsError;

/// Standard deviations below this are treated as zero.
pub const STD_EPSILON: f64 = 1e-12;

/// Trailing window of observations, ending at (and including) the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "WindowRepr", into = "WindowRepr")]
pub enum Window {
    /// Every available observation.
    #[default]
    All,
    /// The last N observations.
    Trailing(usize),
}

impl Window {
    /// The trailing slice of `values` this window covers.
    ///
    /// Fails on `Trailing(0)`. A window longer than the data covers all of it.
    pub fn apply<'a>(&self, values: &'a [f64]) -> Result<&'a [f64], StatsError> {
        match *self {
            Window::All => Ok(values),
            Window::Trailing(0) => Err(StatsError::InvalidParameter(
                "trailing window must be at least 1".into(),
            )),
            Window::Trailing(n) => Ok(&values[values.len().saturating_sub(n)..]),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WindowRepr {
    Count(usize),
    Keyword(String),
}

impl TryFrom<WindowRepr> for Window {
    type Error = String;

    fn try_from(repr: WindowRepr) -> Result<Self, Self::Error> {
        match repr {
            WindowRepr::Count(0) => Err("window must be \"all\" or a positive count".into()),
            WindowRepr::Count(n) => Ok(Window::Trailing(n)),
            WindowRepr::Keyword(s) if s.eq_ignore_ascii_case("all") => Ok(Window::All),
            WindowRepr::Keyword(s) => Err(format!("unknown window '{s}', expected \"all\" or a count")),
        }
    }
}

impl From<Window> for WindowRepr {
    fn from(window: Window) -> Self {
        match window {
            Window::All => WindowRepr::Keyword("all".into()),
            Window::Trailing(n) => WindowRepr::Count(n),
        }
    }
}

/// Mean, standard deviation, and range of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two values.
///
/// A constant window is exactly 0.0 even when its mean is not exactly
/// representable.
pub fn population_std_dev(values: &[f64]) -> f64 {
    let Some((first, rest)) = values.split_first() else {
        return 0.0;
    };
    if rest.iter().all(|v| v == first) {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Summary statistics of a non-empty window.
pub fn window_stats(values: &[f64]) -> Result<WindowStats, StatsError> {
    if values.is_empty() {
        return Err(StatsError::insufficient("window_stats", 1, 0));
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Ok(WindowStats {
        mean: mean(values),
        std: population_std_dev(values),
        min,
        max,
        count: values.len(),
    })
}

/// Statistics over the trailing `window` ending at the series' latest point.
pub fn rolling_stats(series: &TimeSeries, window: Window) -> Result<WindowStats, StatsError> {
    let values = series.values();
    let slice = window.apply(&values)?;
    window_stats(slice).map_err(|_| StatsError::insufficient("rolling_stats", 1, 0))
}

/// Percentage (0–100) of `historical` strictly below `value`.
///
/// Returns 0.0 for an empty history.
pub fn percentile_rank(value: f64, historical: &[f64]) -> f64 {
    if historical.is_empty() {
        return 0.0;
    }
    let below = historical.iter().filter(|&&v| v < value).count();
    below as f64 / historical.len() as f64 * 100.0
}

/// Standard score of `value`; 0.0 when `std` is zero (degenerate window).
pub fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if !std.is_finite() || std < STD_EPSILON {
        return 0.0;
    }
    (value - mean) / std
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn monthly(key: &str, values: &[f64]) -> TimeSeries {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        TimeSeries::from_pairs(
            key,
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (base + chrono::Months::new(i as u32), v)),
        )
        .unwrap()
    }

    #[test]
    fn window_stats_basic() {
        let s = window_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_approx(s.mean, 5.0, DEFAULT_EPSILON);
        // Population std of this textbook set is exactly 2
        assert_approx(s.std, 2.0, DEFAULT_EPSILON);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.count, 8);
    }

    #[test]
    fn window_stats_empty_is_insufficient() {
        assert!(matches!(
            window_stats(&[]),
            Err(StatsError::InsufficientData { required: 1, actual: 0, .. })
        ));
    }

    #[test]
    fn trailing_window_uses_last_n_inclusive() {
        let ts = monthly("m1", &[1.0, 2.0, 3.0, 10.0, 20.0]);
        let s = rolling_stats(&ts, Window::Trailing(2)).unwrap();
        assert_approx(s.mean, 15.0, DEFAULT_EPSILON);
        assert_eq!(s.min, 10.0);
        assert_eq!(s.count, 2);

        let all = rolling_stats(&ts, Window::All).unwrap();
        assert_eq!(all.count, 5);
        assert_eq!(all.min, 1.0);
    }

    #[test]
    fn oversized_window_covers_everything() {
        let ts = monthly("m1", &[1.0, 2.0, 3.0]);
        assert_eq!(rolling_stats(&ts, Window::Trailing(60)).unwrap().count, 3);
    }

    #[test]
    fn zero_window_is_invalid() {
        let ts = monthly("m1", &[1.0, 2.0, 3.0]);
        assert!(matches!(
            rolling_stats(&ts, Window::Trailing(0)),
            Err(StatsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn percentile_rank_is_strict_less_than() {
        let hist = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_rank(1.0, &hist), 0.0);
        assert_eq!(percentile_rank(4.0, &hist), 75.0);
        assert_eq!(percentile_rank(2.5, &hist), 50.0);
        assert_eq!(percentile_rank(5.0, &hist), 100.0);
    }

    #[test]
    fn percentile_rank_constant_history_is_zero() {
        assert_eq!(percentile_rank(7.0, &[7.0; 10]), 0.0);
        assert_eq!(percentile_rank(7.0, &[]), 0.0);
    }

    #[test]
    fn z_score_zero_std_is_zero() {
        assert_eq!(z_score(5.0, 5.0, 0.0), 0.0);
        assert_eq!(z_score(9.0, 5.0, 0.0), 0.0);
        assert_approx(z_score(9.0, 5.0, 2.0), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn window_serde_accepts_all_and_counts() {
        let all: Window = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, Window::All);
        let n: Window = serde_json::from_str("60").unwrap();
        assert_eq!(n, Window::Trailing(60));
        assert!(serde_json::from_str::<Window>("0").is_err());
        assert!(serde_json::from_str::<Window>("\"most\"").is_err());
        assert_eq!(serde_json::to_string(&Window::All).unwrap(), "\"all\"");
    }
}
