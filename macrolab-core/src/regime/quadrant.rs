//! Two-axis quadrant classification with momentum and a bounded trajectory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::error::StatsError;

/// Axis scores are clamped to `[-AXIS_LIMIT, AXIS_LIMIT]`.
pub const AXIS_LIMIT: f64 = 100.0;

/// Trajectory points kept for display.
pub const HISTORY_LEN: usize = 12;

/// Momentum compares the current value with the one this many steps back.
pub const MOMENTUM_STEPS: usize = 3;

/// Axis changes within this band read as flat momentum.
pub const MOMENTUM_EPSILON: f64 = 1e-6;

/// Quadrant of the (x, y) plane. Zero belongs to the non-negative side.
///
/// With x = growth and y = inflation these are the four investment-clock
/// phases; see [`Quadrant::display_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    /// x ≥ 0, y < 0
    A,
    /// x ≥ 0, y ≥ 0
    B,
    /// x < 0, y ≥ 0
    C,
    /// x < 0, y < 0
    D,
}

impl Quadrant {
    pub fn display_name(self) -> &'static str {
        match self {
            Quadrant::A => "Recovery",
            Quadrant::B => "Overheat",
            Quadrant::C => "Stagflation",
            Quadrant::D => "Recession",
        }
    }
}

/// Quadrant of a point, by sign only.
pub fn quadrant_of(x: f64, y: f64) -> Quadrant {
    match (x >= 0.0, y >= 0.0) {
        (true, false) => Quadrant::A,
        (true, true) => Quadrant::B,
        (false, true) => Quadrant::C,
        (false, false) => Quadrant::D,
    }
}

/// One dated position on the two axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisPoint {
    pub date: NaiveDate,
    pub x: f64,
    pub y: f64,
}

impl AxisPoint {
    pub fn new(date: NaiveDate, x: f64, y: f64) -> Self {
        Self { date, x, y }
    }
}

/// Current regime with momentum and recent trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub quadrant: Quadrant,
    pub axis_x: f64,
    pub axis_y: f64,
    pub momentum_x: Direction,
    pub momentum_y: Direction,
    /// Up to [`HISTORY_LEN`] most recent points, oldest first.
    pub history: Vec<AxisPoint>,
}

fn clamp_axis(name: &str, value: f64) -> Result<f64, StatsError> {
    if !value.is_finite() {
        return Err(StatsError::InvalidParameter(format!(
            "{name} axis value must be finite, got {value}"
        )));
    }
    Ok(value.clamp(-AXIS_LIMIT, AXIS_LIMIT))
}

/// Classify a single point. Momentum is flat and history empty.
pub fn classify(x: f64, y: f64) -> Result<RegimeState, StatsError> {
    let x = clamp_axis("x", x)?;
    let y = clamp_axis("y", y)?;
    Ok(RegimeState {
        quadrant: quadrant_of(x, y),
        axis_x: x,
        axis_y: y,
        momentum_x: Direction::Flat,
        momentum_y: Direction::Flat,
        history: Vec::new(),
    })
}

/// Sign of `current − value MOMENTUM_STEPS back`; flat with too little data.
pub fn momentum(values: &[f64]) -> Direction {
    let n = values.len();
    if n <= MOMENTUM_STEPS {
        return Direction::Flat;
    }
    Direction::from_delta(values[n - 1] - values[n - 1 - MOMENTUM_STEPS], MOMENTUM_EPSILON)
}

/// The last [`HISTORY_LEN`] points in date order; older points are dropped.
pub fn track_history(points: &[AxisPoint]) -> Vec<AxisPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);
    let start = sorted.len().saturating_sub(HISTORY_LEN);
    sorted.split_off(start)
}

/// Classify the latest point of a trajectory, with momentum on each axis.
pub fn classify_trajectory(points: &[AxisPoint]) -> Result<RegimeState, StatsError> {
    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.date);
    let latest = *ordered
        .last()
        .ok_or_else(|| StatsError::insufficient("regime", 1, 0))?;

    let xs = ordered
        .iter()
        .map(|p| clamp_axis("x", p.x))
        .collect::<Result<Vec<_>, _>>()?;
    let ys = ordered
        .iter()
        .map(|p| clamp_axis("y", p.y))
        .collect::<Result<Vec<_>, _>>()?;

    let mut state = classify(latest.x, latest.y)?;
    state.momentum_x = momentum(&xs);
    state.momentum_y = momentum(&ys);
    state.history = track_history(
        &ordered
            .iter()
            .zip(xs.iter().zip(&ys))
            .map(|(p, (&x, &y))| AxisPoint::new(p.date, x, y))
            .collect::<Vec<_>>(),
    );
    Ok(state)
}
