//! Score backtesting: does a higher score predict a better forward outcome?
//!
//! [`forward`] joins a historical score series to the series it predicts;
//! [`bucket`] partitions the scores into bands, averages each band's
//! outcome, and grades how monotonically those averages move.

pub mod bucket;
pub mod forward;

pub use bucket::{
    band_index, bucket, monotonicity, validate_edges, BacktestBucket, BacktestResult,
    Monotonicity, ScoredObservation, Trend, DEFAULT_BAND_EDGES,
};
pub use forward::{bond_duration, forward_observations, OutcomeModel};

use crate::domain::TimeSeries;
use crate::error::StatsError;

/// Forward-join `scores` to `underlying` and bucket the result.
pub fn backtest_scores(
    scores: &TimeSeries,
    underlying: &TimeSeries,
    horizon_steps: usize,
    model: OutcomeModel,
    band_edges: &[f64],
) -> Result<BacktestResult, StatsError> {
    validate_edges(band_edges)?;
    let history = forward_observations(scores, underlying, horizon_steps, model)?;
    bucket(&history, band_edges, horizon_steps)
}
