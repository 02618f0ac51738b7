//! MacroLab Core: statistics engine for multi-series macro and market data.
//!
//! This crate is the pure, synchronous half of MacroLab:
//! - Validated time series and date alignment (intersection / union)
//! - Windowed descriptive statistics, percentile rank, z-score
//! - Pairwise correlation with deterministic ranking
//! - Lead-lag correlation and directional forecast
//! - Quadrant regimes (investment clock) and trend regimes
//! - Alert scanning with severity ranking
//! - Score backtests with graded monotonicity
//!
//! Every operation is a function of immutable inputs. Degenerate inputs
//! resolve to documented sentinel values; unmet sample-size preconditions
//! surface as [`StatsError::InsufficientData`].

pub mod align;
pub mod anomaly;
pub mod backtest;
pub mod correlation;
pub mod domain;
pub mod error;
pub mod explain;
pub mod lead_lag;
pub mod regime;
pub mod stats;

pub use align::{align, AlignMode, AlignedSeriesSet};
pub use domain::{Direction, Observation, SeriesKey, TimeSeries};
pub use error::StatsError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all result types are Send + Sync.
    ///
    /// The runner fans work out across a rayon pool and collects these
    /// values back; if any type stops being thread-safe the build breaks here.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::TimeSeries>();
        require_sync::<domain::TimeSeries>();
        require_send::<domain::Observation>();
        require_sync::<domain::Observation>();
        require_send::<align::AlignedSeriesSet>();
        require_sync::<align::AlignedSeriesSet>();
        require_send::<error::StatsError>();
        require_sync::<error::StatsError>();

        // Statistics
        require_send::<stats::WindowStats>();
        require_sync::<stats::WindowStats>();
        require_send::<stats::StatSnapshot>();
        require_sync::<stats::StatSnapshot>();
        require_send::<stats::PeriodTrend>();
        require_sync::<stats::PeriodTrend>();

        // Correlation and lead-lag
        require_send::<correlation::CorrelationEntry>();
        require_sync::<correlation::CorrelationEntry>();
        require_send::<correlation::TopCorrelations>();
        require_sync::<correlation::TopCorrelations>();
        require_send::<lead_lag::LeadLagResult>();
        require_sync::<lead_lag::LeadLagResult>();
        require_send::<lead_lag::CorrelogramPoint>();
        require_sync::<lead_lag::CorrelogramPoint>();

        // Regimes
        require_send::<regime::RegimeState>();
        require_sync::<regime::RegimeState>();
        require_send::<regime::TrendRegimeReading>();
        require_sync::<regime::TrendRegimeReading>();

        // Alerts and backtests
        require_send::<anomaly::AlertEvent>();
        require_sync::<anomaly::AlertEvent>();
        require_send::<backtest::BacktestResult>();
        require_sync::<backtest::BacktestResult>();
        require_send::<backtest::OutcomeModel>();
        require_sync::<backtest::OutcomeModel>();
        require_send::<explain::ScoreApproximation>();
        require_sync::<explain::ScoreApproximation>();
    }
}
