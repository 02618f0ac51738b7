//! Three-state movement direction shared by momentum, forecasts and trends.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Direction of `delta`, treating `|delta| <= epsilon` as flat.
    pub fn from_delta(delta: f64, epsilon: f64) -> Self {
        if delta > epsilon {
            Direction::Up
        } else if delta < -epsilon {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    /// Swap up and down; flat stays flat.
    pub fn inverted(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Flat => Direction::Flat,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Flat => "flat",
        }
    }
}
