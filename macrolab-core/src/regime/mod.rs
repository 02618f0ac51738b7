//! Regime classification.
//!
//! - [`quadrant`]: sign-based quadrant of two pre-normalized axis scores,
//!   with momentum and a bounded trajectory.
//! - [`clock`]: builds growth/inflation axes from raw macro series.
//! - [`trend`]: extended vs mean-reverting runs around a moving average.

pub mod clock;
pub mod quadrant;
pub mod trend;

pub use clock::{clock_history, growth_score, inflation_score, investment_clock, ClockReading};
pub use quadrant::{
    classify, classify_trajectory, momentum, quadrant_of, track_history, AxisPoint, Quadrant,
    RegimeState,
};
pub use trend::{trend_regime, AverageSide, TrendRegime, TrendRegimeParams, TrendRegimeReading};
