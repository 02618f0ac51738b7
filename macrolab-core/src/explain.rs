//! Explanatory approximation of the bond composite score.
//!
//! The authoritative score is computed elsewhere from inputs this engine
//! does not see. [`approximate_bond_score`] rebuilds a simplified version
//! from a few headline factors so a host can show where the score comes
//! from. The two numbers are reported side by side with their gap; neither
//! is ever adjusted toward the other. Constants here are simplified and may
//! drift from the authoritative formula.

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

const BASE_SCORE: f64 = 50.0;
const VALUATION_WEIGHT: f64 = 0.6;
const TREND_SCALE_PCT: f64 = 5.0;
const TREND_WEIGHT: f64 = 8.0;
const RSI_WEIGHT: f64 = 6.0;

/// Trend deviation assumed when the caller does not supply one.
pub const ASSUMED_TREND_DEVIATION_PCT: f64 = 2.0;

/// RSI assumed when the caller does not supply one (neutral).
pub const ASSUMED_RSI: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ApproximationInputs {
    /// Valuation percentile, 0–100 (higher is cheaper).
    pub valuation_percentile: f64,
    /// Deviation from the moving average in percent, positive when supportive.
    pub trend_deviation_pct: Option<f64>,
    /// Relative strength index, 0–100.
    pub rsi: Option<f64>,
    /// The score as computed by the authoritative pipeline, if known.
    pub authoritative_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Base,
    Valuation,
    Trend,
    Rsi,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: Factor,
    pub points: f64,
}

/// An approximate score, labelled as such, next to the authoritative one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreApproximation {
    pub contributions: Vec<FactorContribution>,
    /// Sum of contributions clamped to 0–100.
    pub approximate_score: f64,
    pub authoritative_score: Option<f64>,
    /// `authoritative − approximate`, when the authoritative score is known.
    pub gap: Option<f64>,
    /// Defaults filled in for missing inputs.
    pub assumptions: Vec<String>,
}

fn finite(name: &str, value: f64) -> Result<f64, StatsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StatsError::InvalidParameter(format!("{name} must be finite, got {value}")))
    }
}

/// Rebuild an approximate bond score from headline factors.
pub fn approximate_bond_score(inputs: &ApproximationInputs) -> Result<ScoreApproximation, StatsError> {
    let percentile = finite("valuation percentile", inputs.valuation_percentile)?;
    let mut assumptions = Vec::new();

    let deviation = match inputs.trend_deviation_pct {
        Some(d) => finite("trend deviation", d)?,
        None => {
            assumptions.push(format!(
                "trend deviation assumed to be {ASSUMED_TREND_DEVIATION_PCT}%"
            ));
            ASSUMED_TREND_DEVIATION_PCT
        }
    };
    let rsi = match inputs.rsi {
        Some(r) => finite("rsi", r)?,
        None => {
            assumptions.push(format!("rsi assumed neutral at {ASSUMED_RSI}"));
            ASSUMED_RSI
        }
    };
    let authoritative_score = inputs
        .authoritative_score
        .map(|s| finite("authoritative score", s))
        .transpose()?;

    let contributions = vec![
        FactorContribution { factor: Factor::Base, points: BASE_SCORE },
        FactorContribution {
            factor: Factor::Valuation,
            points: (percentile - 50.0) * VALUATION_WEIGHT,
        },
        FactorContribution {
            factor: Factor::Trend,
            points: (deviation / TREND_SCALE_PCT).clamp(-1.0, 1.0) * TREND_WEIGHT,
        },
        FactorContribution {
            factor: Factor::Rsi,
            points: (rsi - 50.0) / 50.0 * RSI_WEIGHT,
        },
    ];
    let approximate_score = contributions
        .iter()
        .map(|c| c.points)
        .sum::<f64>()
        .clamp(0.0, 100.0);

    Ok(ScoreApproximation {
        contributions,
        approximate_score,
        authoritative_score,
        gap: authoritative_score.map(|s| s - approximate_score),
        assumptions,
    })
}
