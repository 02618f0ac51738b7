//! Lead-lag analysis between two series.
//!
//! Both series are placed on their union date axis and min-max scaled to
//! 0–100 so that unlike units compare. The lead is then paired with the lag
//! `shift` steps later, using only dates where both exist, and the Pearson
//! coefficient of the pairs is reported together with a directional
//! forecast read off the most recent lead values.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::align::{align_unchecked, AlignMode};
use crate::correlation::pearson;
use crate::domain::{Direction, TimeSeries};
use crate::error::StatsError;

/// Midpoint of the normalized scale.
pub const MIDPOINT: f64 = 50.0;

/// Half-width of the band around the midpoint read as "flat".
pub const FLAT_BAND: f64 = 1.0;

/// Number of recent lead values averaged for the forecast.
pub const FORECAST_LOOKBACK: usize = 3;

/// Observations required beyond the shift itself.
const EXTRA_OBSERVATIONS: usize = 4;

/// A hypothesised lead-lag relationship between two named series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadLagPair {
    pub lead_key: String,
    pub lag_key: String,
    /// Lead in observation steps (> 0).
    pub shift: usize,
    /// Negate the lead before correlating (e.g. rates leading activity).
    #[serde(default)]
    pub invert_lead: bool,
}

impl LeadLagPair {
    pub fn new(lead_key: impl Into<String>, lag_key: impl Into<String>, shift: usize) -> Self {
        Self {
            lead_key: lead_key.into(),
            lag_key: lag_key.into(),
            shift,
            invert_lead: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert_lead = true;
        self
    }
}

/// Outcome of one lead-lag analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadLagResult {
    pub lead_key: String,
    pub lag_key: String,
    pub shift: usize,
    pub inverted: bool,
    /// Pearson coefficient of the shifted, normalized pairs.
    pub correlation: f64,
    pub predicted_direction: Direction,
    /// `|lead_average − 50| / 50`, in [0, 1].
    pub confidence: f64,
    /// Mean of the most recent normalized lead values.
    pub lead_average: f64,
    /// Number of (lead, lag) pairs the correlation used.
    pub sample_size: usize,
}

/// Min-max scale to 0–100. A constant input maps to 50 everywhere.
pub fn normalize_0_100(values: &[f64]) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![MIDPOINT; values.len()];
    }
    values.iter().map(|v| (v - min) / range * 100.0).collect()
}

/// Scale the present entries of a gapped column, leaving gaps in place.
fn normalize_column(column: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let mut scaled = normalize_0_100(&present).into_iter();
    column
        .iter()
        .map(|v| v.and_then(|_| scaled.next()))
        .collect()
}

/// Both series on their union axis, each normalized over its own values.
struct NormalizedPair {
    lead: Vec<Option<f64>>,
    lag: Vec<Option<f64>>,
    /// Dates on which both series have a value.
    shared: usize,
}

impl NormalizedPair {
    fn build(lead: &TimeSeries, lag: &TimeSeries) -> Self {
        let aligned = align_unchecked(&[lead, lag], AlignMode::Union);
        let lead = normalize_column(&aligned.columns[0]);
        let lag = normalize_column(&aligned.columns[1]);
        let shared = lead
            .iter()
            .zip(&lag)
            .filter(|(l, g)| l.is_some() && g.is_some())
            .count();
        Self { lead, lag, shared }
    }

    fn len(&self) -> usize {
        self.lead.len()
    }

    fn check_len(&self, shift: usize) -> Result<(), StatsError> {
        let required = shift + EXTRA_OBSERVATIONS;
        if self.shared < required {
            return Err(StatsError::insufficient("lead_lag", required, self.shared));
        }
        Ok(())
    }

    /// `(lead[i − shift], lag[i])` for every `i` where both exist.
    fn shifted(&self, shift: usize, invert: bool) -> (Vec<f64>, Vec<f64>) {
        let sign = if invert { -1.0 } else { 1.0 };
        (shift..self.len())
            .filter_map(|i| match (self.lead[i - shift], self.lag[i]) {
                (Some(l), Some(g)) => Some((sign * l, g)),
                _ => None,
            })
            .unzip()
    }

    fn recent_lead_average(&self) -> Option<f64> {
        let present: Vec<f64> = self.lead.iter().flatten().copied().collect();
        let recent = &present[present.len().saturating_sub(FORECAST_LOOKBACK)..];
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }
}

fn check_shift(shift: usize) -> Result<(), StatsError> {
    if shift == 0 {
        return Err(StatsError::InvalidParameter(
            "lead-lag shift must be at least 1 step".into(),
        ));
    }
    Ok(())
}

/// Correlate `lead` against `lag` shifted `shift` steps and forecast the lag.
///
/// Fails with `InsufficientData` when the two series share fewer than
/// `shift + 4` dates, and with `InvalidParameter` on a zero shift.
pub fn analyze(
    lead: &TimeSeries,
    lag: &TimeSeries,
    shift: usize,
    invert_lead: bool,
) -> Result<LeadLagResult, StatsError> {
    check_shift(shift)?;
    let pair = NormalizedPair::build(lead, lag);
    pair.check_len(shift)?;

    let (xs, ys) = pair.shifted(shift, invert_lead);
    let correlation = pearson(&xs, &ys);

    let (predicted_direction, confidence, lead_average) = match pair.recent_lead_average() {
        Some(avg) => {
            let raw = Direction::from_delta(avg - MIDPOINT, FLAT_BAND);
            let direction = if invert_lead { raw.inverted() } else { raw };
            let confidence = ((avg - MIDPOINT).abs() / MIDPOINT).clamp(0.0, 1.0);
            (direction, confidence, avg)
        }
        None => (Direction::Flat, 0.0, MIDPOINT),
    };

    Ok(LeadLagResult {
        lead_key: lead.key().to_string(),
        lag_key: lag.key().to_string(),
        shift,
        inverted: invert_lead,
        correlation,
        predicted_direction,
        confidence,
        lead_average,
        sample_size: xs.len(),
    })
}

/// [`analyze`] driven by a [`LeadLagPair`] description.
pub fn analyze_pair(
    pair: &LeadLagPair,
    lead: &TimeSeries,
    lag: &TimeSeries,
) -> Result<LeadLagResult, StatsError> {
    analyze(lead, lag, pair.shift, pair.invert_lead)
}

/// Shifted correlation at one candidate shift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelogramPoint {
    pub shift: usize,
    pub correlation: f64,
    pub sample_size: usize,
}

/// Shifted correlation for every shift in `shifts` with enough data.
///
/// Shifts whose `shift + 4` requirement is not met are left out; if none
/// qualifies the call fails with `InsufficientData` for the smallest one.
pub fn cross_correlogram(
    lead: &TimeSeries,
    lag: &TimeSeries,
    shifts: RangeInclusive<usize>,
    invert_lead: bool,
) -> Result<Vec<CorrelogramPoint>, StatsError> {
    let (first, last) = (*shifts.start(), *shifts.end());
    if first > last {
        return Err(StatsError::InvalidParameter(format!(
            "empty shift range {first}..={last}"
        )));
    }
    check_shift(first)?;

    let pair = NormalizedPair::build(lead, lag);
    pair.check_len(first)?;

    Ok(shifts
        .take_while(|&shift| pair.check_len(shift).is_ok())
        .map(|shift| {
            let (xs, ys) = pair.shifted(shift, invert_lead);
            CorrelogramPoint {
                shift,
                correlation: pearson(&xs, &ys),
                sample_size: xs.len(),
            }
        })
        .collect())
}

/// Point with the largest `|correlation|`; ties go to the smaller shift.
pub fn best_shift(points: &[CorrelogramPoint]) -> Option<CorrelogramPoint> {
    points.iter().copied().reduce(|best, p| {
        let (b, c) = (best.correlation.abs(), p.correlation.abs());
        if c > b || (c == b && p.shift < best.shift) {
            p
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{assert_approx, make_series, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn rising(key: &str, n: usize) -> TimeSeries {
        let values: Vec<f64> = (0..n).map(|i| i as f64 * 10.0).collect();
        make_series(key, &values)
    }

    /// `values` placed `offset` days after 2024-01-01.
    fn offset_series(key: &str, values: &[f64], offset: i64) -> TimeSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        TimeSeries::from_pairs(
            key,
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (base + chrono::Duration::days(offset + i as i64), v)),
        )
        .unwrap()
    }

    #[test]
    fn shifted_copy_correlates_perfectly_and_forecasts_up() {
        let values: Vec<f64> = (0..20).map(|i| i as f64 * 10.0).collect();
        let lead = offset_series("lead", &values, 0);
        let lag = offset_series("lag", &values, 3);

        let result = analyze(&lead, &lag, 3, false).unwrap();
        assert_approx(result.correlation, 1.0, DEFAULT_EPSILON);
        assert_eq!(result.predicted_direction, Direction::Up);
        assert!(result.confidence > 0.8);
        assert_eq!(result.sample_size, 20);
    }

    #[test]
    fn inversion_flips_correlation_and_forecast() {
        let values: Vec<f64> = (0..20).map(|i| i as f64 * 10.0).collect();
        let lead = offset_series("lpr", &values, 0);
        let lag = offset_series("property", &values, 3);

        let result = analyze(&lead, &lag, 3, true).unwrap();
        assert_approx(result.correlation, -1.0, DEFAULT_EPSILON);
        assert_eq!(result.predicted_direction, Direction::Down);
        assert!(result.inverted);
    }

    #[test]
    fn falling_lead_forecasts_down() {
        let values: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
        let lead = make_series("lead", &values);
        let lag = make_series("lag", &values);
        let result = analyze(&lead, &lag, 2, false).unwrap();
        assert_eq!(result.predicted_direction, Direction::Down);
    }

    #[test]
    fn constant_lead_is_flat_with_zero_confidence() {
        let lead = make_series("lead", &[7.0; 10]);
        let lag = rising("lag", 10);
        let result = analyze(&lead, &lag, 2, false).unwrap();
        assert_eq!(result.predicted_direction, Direction::Flat);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.correlation, 0.0);
    }

    #[test]
    fn too_few_observations_is_insufficient() {
        let lead = rising("lead", 6);
        let lag = rising("lag", 6);
        let err = analyze(&lead, &lag, 3, false).unwrap_err();
        assert_eq!(
            err,
            StatsError::InsufficientData {
                operation: "lead_lag",
                required: 7,
                actual: 6
            }
        );
        assert!(analyze(&lead, &lag, 2, false).is_ok());
    }

    #[test]
    fn disjoint_series_are_insufficient() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let lead = offset_series("lead", &values, 0);
        let lag = offset_series("lag", &values, 366);
        assert_eq!(
            analyze(&lead, &lag, 1, false).unwrap_err(),
            StatsError::InsufficientData {
                operation: "lead_lag",
                required: 5,
                actual: 0
            }
        );
        assert!(cross_correlogram(&lead, &lag, 1..=3, false).is_err());
    }

    #[test]
    fn barely_overlapping_series_count_only_shared_dates() {
        // 18 union dates, only 2 shared
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let lead = offset_series("lead", &values, 0);
        let lag = offset_series("lag", &values, 8);

        assert_eq!(
            analyze(&lead, &lag, 3, false).unwrap_err(),
            StatsError::InsufficientData {
                operation: "lead_lag",
                required: 7,
                actual: 2
            }
        );
        assert!(analyze(&lead, &lag, 1, false).is_err());
    }

    #[test]
    fn zero_shift_is_invalid() {
        let s = rising("s", 10);
        assert!(matches!(
            analyze(&s, &s, 0, false),
            Err(StatsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn normalize_maps_to_unit_hundred() {
        assert_eq!(normalize_0_100(&[2.0, 4.0, 6.0]), vec![0.0, 50.0, 100.0]);
        assert_eq!(normalize_0_100(&[3.0, 3.0]), vec![50.0, 50.0]);
        assert!(normalize_0_100(&[]).is_empty());
    }

    #[test]
    fn correlogram_finds_true_shift() {
        // lag[i] = lead[i - 2] on a non-monotonic pattern
        let pattern = [
            1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0, 7.0, 2.0, 6.0, 1.0, 8.0, 3.0, 5.0, 9.0, 2.0,
        ];
        let lead = offset_series("lead", &pattern, 0);
        let lag = offset_series("lag", &pattern, 2);

        let points = cross_correlogram(&lead, &lag, 1..=5, false).unwrap();
        assert_eq!(points.len(), 5);
        let best = best_shift(&points).unwrap();
        assert_eq!(best.shift, 2);
        assert_approx(best.correlation, 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn correlogram_stops_where_data_runs_out() {
        let lead = rising("lead", 8);
        let lag = rising("lag", 8);
        let points = cross_correlogram(&lead, &lag, 1..=10, false).unwrap();
        assert_eq!(points.last().map(|p| p.shift), Some(4));
        assert!(cross_correlogram(&lead, &lag, 5..=10, false).is_err());
    }

    #[test]
    fn best_shift_ties_go_to_smaller_shift() {
        let point = |shift, correlation| CorrelogramPoint {
            shift,
            correlation,
            sample_size: 10,
        };
        let points = [point(3, 0.8), point(1, -0.8), point(2, 0.5)];
        assert_eq!(best_shift(&points).unwrap().shift, 1);
        assert!(best_shift(&[]).is_none());
    }
}
