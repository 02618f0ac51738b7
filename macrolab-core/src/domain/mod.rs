//! Domain types: validated series and shared enumerations.

pub mod direction;
pub mod series;

pub use direction::Direction;
pub use series::{Observation, TimeSeries};

/// Identifier of a series within a snapshot (e.g. `"cpi"`, `"m1"`).
pub type SeriesKey = String;
