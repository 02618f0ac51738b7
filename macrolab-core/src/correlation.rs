//! Pairwise Pearson correlation across a set of series.
//!
//! Each pair is aligned on its common dates before the coefficient is
//! computed. A pair with fewer than three common dates, or with a constant
//! side, gets coefficient 0 and keeps its `sample_size` so callers can tell
//! a weak relationship from an undefined one.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::align::{paired_values, MIN_ALIGNED_POINTS};
use crate::domain::TimeSeries;

/// Default threshold for the filtered query.
pub const DEFAULT_MIN_ABS_CORRELATION: f64 = 0.6;

/// Pearson coefficient of two equal-length vectors.
///
/// Returns 0.0 below three samples or when either side has zero variance.
/// Only the common prefix is used if lengths differ.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < MIN_ALIGNED_POINTS {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    // Rounding in the mean leaves a constant side with a tiny nonzero spread
    if is_constant(x) || is_constant(y) {
        return 0.0;
    }
    let denominator = (denom_x * denom_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Coarse label for the magnitude of a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn classify(coefficient: f64) -> Self {
        let abs = coefficient.abs();
        if abs > 0.7 {
            CorrelationStrength::Strong
        } else if abs > 0.4 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Weak => "weak",
        }
    }
}

/// Correlation of one pair of series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub series_a: String,
    pub series_b: String,
    /// Pearson coefficient in [-1, 1].
    pub coefficient: f64,
    /// Number of common dates the coefficient was computed over.
    pub sample_size: usize,
}

impl CorrelationEntry {
    pub fn strength(&self) -> CorrelationStrength {
        CorrelationStrength::classify(self.coefficient)
    }

    /// True when the sample was too small for a defined coefficient.
    pub fn is_undersampled(&self) -> bool {
        self.sample_size < MIN_ALIGNED_POINTS
    }
}

/// Correlate two series on their common dates.
pub fn correlate_pair(a: &TimeSeries, b: &TimeSeries) -> CorrelationEntry {
    let (xs, ys) = paired_values(a, b);
    let coefficient = pearson(&xs, &ys);
    if xs.len() < MIN_ALIGNED_POINTS {
        debug!(
            series_a = a.key(),
            series_b = b.key(),
            sample_size = xs.len(),
            "correlation undersampled, reporting 0"
        );
    }
    CorrelationEntry {
        series_a: a.key().to_string(),
        series_b: b.key().to_string(),
        coefficient,
        sample_size: xs.len(),
    }
}

/// Index pairs `(i, j)` with `i < j` for `n` series, in row-major order.
pub fn pair_indices(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Ordering of a ranked result: `|coefficient|` descending, then keys.
pub fn compare_entries(a: &CorrelationEntry, b: &CorrelationEntry) -> Ordering {
    b.coefficient
        .abs()
        .total_cmp(&a.coefficient.abs())
        .then_with(|| a.series_a.cmp(&b.series_a))
        .then_with(|| a.series_b.cmp(&b.series_b))
}

/// Sort entries into ranked order in place.
pub fn sort_entries(entries: &mut [CorrelationEntry]) {
    entries.sort_by(compare_entries);
}

/// Correlate every unordered pair, ranked by absolute coefficient.
pub fn correlate_all(series: &[TimeSeries]) -> Vec<CorrelationEntry> {
    let mut entries: Vec<CorrelationEntry> = pair_indices(series.len())
        .into_iter()
        .map(|(i, j)| correlate_pair(&series[i], &series[j]))
        .collect();
    sort_entries(&mut entries);
    entries
}

/// Entries with `|coefficient| >= min_abs`, order preserved.
pub fn filter_by_strength(entries: &[CorrelationEntry], min_abs: f64) -> Vec<CorrelationEntry> {
    entries
        .iter()
        .filter(|e| e.coefficient.abs() >= min_abs)
        .cloned()
        .collect()
}

/// Strongest positive and strongest negative relationships.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopCorrelations {
    pub positive: Vec<CorrelationEntry>,
    pub negative: Vec<CorrelationEntry>,
}

/// Up to `n` strongest positive and `n` strongest negative entries.
///
/// Expects ranked input (as returned by [`correlate_all`]). Zero
/// coefficients belong to neither side.
pub fn top_correlations(entries: &[CorrelationEntry], n: usize) -> TopCorrelations {
    let pick = |keep: fn(f64) -> bool| -> Vec<CorrelationEntry> {
        entries
            .iter()
            .filter(|e| keep(e.coefficient))
            .take(n)
            .cloned()
            .collect()
    };
    TopCorrelations {
        positive: pick(|r| r > 0.0),
        negative: pick(|r| r < 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{assert_approx, make_series, DEFAULT_EPSILON};

    fn entry(a: &str, b: &str, coefficient: f64, sample_size: usize) -> CorrelationEntry {
        CorrelationEntry {
            series_a: a.into(),
            series_b: b.into(),
            coefficient,
            sample_size,
        }
    }

    #[test]
    fn perfect_negative_correlation() {
        let a = make_series("a", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let b = make_series("b", &[10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let entry = correlate_pair(&a, &b);
        assert_approx(entry.coefficient, -1.0, 1e-12);
        assert_eq!(entry.sample_size, 10);
        assert_eq!(entry.strength(), CorrelationStrength::Strong);
    }

    #[test]
    fn self_correlation_is_one() {
        let a = make_series("a", &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
        assert_approx(correlate_pair(&a, &a).coefficient, 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_side_yields_zero() {
        let a = make_series("a", &[1.0, 2.0, 3.0, 4.0]);
        let b = make_series("b", &[5.0; 4]);
        let entry = correlate_pair(&a, &b);
        assert_eq!(entry.coefficient, 0.0);
        assert_eq!(entry.sample_size, 4);

        let inexact = make_series("c", &[0.1; 4]);
        assert_eq!(correlate_pair(&a, &inexact).coefficient, 0.0);
    }

    #[test]
    fn short_overlap_yields_zero_with_sample_size() {
        let a = make_series("a", &[1.0, 2.0]);
        let b = make_series("b", &[2.0, 4.0, 9.0]);
        let entry = correlate_pair(&a, &b);
        assert_eq!(entry.coefficient, 0.0);
        assert_eq!(entry.sample_size, 2);
        assert!(entry.is_undersampled());
    }

    #[test]
    fn symmetry() {
        let a = make_series("a", &[1.0, 3.0, 2.0, 5.0, 4.0, 6.0]);
        let b = make_series("b", &[2.0, 2.5, 2.0, 4.0, 3.5, 7.0]);
        assert_eq!(
            correlate_pair(&a, &b).coefficient,
            correlate_pair(&b, &a).coefficient
        );
    }

    #[test]
    fn correlate_all_ranks_by_magnitude_with_key_tiebreak() {
        let up = make_series("up", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let down = make_series("down", &[5.0, 4.0, 3.0, 2.0, 1.0]);
        let noisy = make_series("noisy", &[1.0, 3.0, 2.0, 3.0, 2.0]);
        let ranked = correlate_all(&[up, down, noisy]);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].series_a, "up");
        assert_eq!(ranked[0].series_b, "down");
        assert!(ranked
            .windows(2)
            .all(|w| w[0].coefficient.abs() >= w[1].coefficient.abs()));
        // up/noisy and down/noisy have equal magnitude; "down" < "up"
        assert_eq!(ranked[1].series_a, "down");
        assert_eq!(ranked[2].series_a, "up");
    }

    #[test]
    fn filter_keeps_threshold_and_order() {
        let entries = vec![
            entry("a", "b", -0.9, 10),
            entry("a", "c", 0.6, 10),
            entry("b", "c", 0.2, 10),
        ];
        let strong = filter_by_strength(&entries, 0.6);
        assert_eq!(strong.len(), 2);
        assert_eq!(strong[0].coefficient, -0.9);
        assert_eq!(strong[1].coefficient, 0.6);
    }

    #[test]
    fn top_correlations_splits_by_sign() {
        let entries = vec![
            entry("a", "b", -0.9, 10),
            entry("a", "c", 0.8, 10),
            entry("a", "d", 0.7, 10),
            entry("b", "c", 0.5, 10),
            entry("c", "d", 0.0, 2),
        ];
        let top = top_correlations(&entries, 2);
        assert_eq!(top.positive.len(), 2);
        assert_eq!(top.positive[0].coefficient, 0.8);
        assert_eq!(top.positive[1].coefficient, 0.7);
        assert_eq!(top.negative.len(), 1);
    }

    #[test]
    fn pair_indices_cover_all_unordered_pairs() {
        assert_eq!(pair_indices(3), vec![(0, 1), (0, 2), (1, 2)]);
        assert!(pair_indices(1).is_empty());
    }

    #[test]
    fn strength_labels() {
        assert_eq!(CorrelationStrength::classify(0.71), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(-0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(0.4), CorrelationStrength::Weak);
    }
}
