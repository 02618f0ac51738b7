//! Score bands and the monotonicity test.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Bands used by the bond report: five equal bands over 0–100.
pub const DEFAULT_BAND_EDGES: [f64; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];

/// One historical score with the outcome observed `horizon` steps later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredObservation {
    pub date: NaiveDate,
    pub score: f64,
    /// Outcome the score is meant to predict (e.g. approximate return, %).
    pub forward_return: f64,
    /// Raw change of the underlying over the horizon.
    pub forward_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestBucket {
    pub min_score: f64,
    pub max_score: f64,
    pub sample_count: usize,
    /// `None` when the band is empty.
    pub avg_forward_return: Option<f64>,
    pub avg_forward_change: Option<f64>,
}

/// Direction the band means are expected to move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
}

/// Result of comparing adjacent non-empty band means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Monotonicity {
    pub is_monotonic: bool,
    /// Fraction of adjacent pairs that follow `direction`, in [0, 1].
    pub score: f64,
    pub direction: Trend,
    pub preserving_pairs: usize,
    pub total_pairs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub horizon_steps: usize,
    pub buckets: Vec<BacktestBucket>,
    pub is_monotonic: bool,
    pub monotonicity_score: f64,
    pub direction: Trend,
    /// Observations that fell in some band.
    pub sample_count: usize,
    /// Observations whose score lies outside every band.
    pub excluded_count: usize,
}

/// Check that band edges are finite, strictly increasing, and at least two.
pub fn validate_edges(edges: &[f64]) -> Result<(), StatsError> {
    if edges.len() < 2 {
        return Err(StatsError::InvalidParameter(format!(
            "need at least 2 band edges, got {}",
            edges.len()
        )));
    }
    if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
        return Err(StatsError::InvalidParameter(format!(
            "band edge {bad} is not finite"
        )));
    }
    if let Some(w) = edges.windows(2).find(|w| w[0] >= w[1]) {
        return Err(StatsError::InvalidParameter(format!(
            "band edges must be strictly increasing, got {} then {}",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// Index of the band containing `score`, or `None` if outside all bands.
///
/// Bands are half-open `[min, max)` except the top band, which also
/// includes its upper edge.
pub fn band_index(score: f64, edges: &[f64]) -> Option<usize> {
    let bands = edges.len().checked_sub(1)?;
    (0..bands).find(|&i| {
        let (lo, hi) = (edges[i], edges[i + 1]);
        score >= lo && (score < hi || (i + 1 == bands && score == hi))
    })
}

/// Graded monotonicity of a sequence of band means.
///
/// The direction is set by the first adjacent pair whose means differ;
/// all-equal means count as increasing. A pair preserves the direction
/// when it does not move against it. Fewer than two means is trivially
/// monotonic with score 1.
pub fn monotonicity(means: &[f64]) -> Monotonicity {
    let direction = match means.windows(2).find(|w| w[0] != w[1]) {
        Some(w) if w[1] < w[0] => Trend::Decreasing,
        _ => Trend::Increasing,
    };
    let total_pairs = means.len().saturating_sub(1);
    let preserving_pairs = means
        .windows(2)
        .filter(|w| match direction {
            Trend::Increasing => w[0] <= w[1],
            Trend::Decreasing => w[0] >= w[1],
        })
        .count();
    let score = if total_pairs == 0 {
        1.0
    } else {
        preserving_pairs as f64 / total_pairs as f64
    };
    Monotonicity {
        is_monotonic: preserving_pairs == total_pairs,
        score,
        direction,
        preserving_pairs,
        total_pairs,
    }
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Partition scored observations into bands and test monotonicity of the
/// per-band mean forward return.
pub fn bucket(
    history: &[ScoredObservation],
    band_edges: &[f64],
    horizon_steps: usize,
) -> Result<BacktestResult, StatsError> {
    validate_edges(band_edges)?;

    let bands = band_edges.len() - 1;
    let mut members: Vec<Vec<&ScoredObservation>> = vec![Vec::new(); bands];
    let mut excluded_count = 0;
    for obs in history {
        match band_index(obs.score, band_edges) {
            Some(i) => members[i].push(obs),
            None => excluded_count += 1,
        }
    }

    let buckets: Vec<BacktestBucket> = members
        .iter()
        .enumerate()
        .map(|(i, obs)| BacktestBucket {
            min_score: band_edges[i],
            max_score: band_edges[i + 1],
            sample_count: obs.len(),
            avg_forward_return: average(obs.iter().map(|o| o.forward_return)),
            avg_forward_change: average(obs.iter().map(|o| o.forward_change)),
        })
        .collect();

    let means: Vec<f64> = buckets.iter().filter_map(|b| b.avg_forward_return).collect();
    let mono = monotonicity(&means);

    Ok(BacktestResult {
        horizon_steps,
        sample_count: history.len() - excluded_count,
        buckets,
        is_monotonic: mono.is_monotonic,
        monotonicity_score: mono.score,
        direction: mono.direction,
        excluded_count,
    })
}
