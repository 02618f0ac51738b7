//! Forward outcomes: join a score series to the series it is meant to predict.

use serde::{Deserialize, Serialize};

use super::bucket::ScoredObservation;
use crate::domain::TimeSeries;
use crate::error::StatsError;

/// How the forward outcome is derived from the underlying series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum OutcomeModel {
    /// `future − current`.
    Change,
    /// `(future / current − 1) · 100`. Skipped when `current` is 0.
    PercentReturn,
    /// Approximate bond return (%) from a yield series.
    ///
    /// Duration is `clamp(6 + (y − 2)·2, 5, 10)` years; return is
    /// `duration · (y − y_future) + coupon · horizon / periods_per_year`.
    BondDurationApprox {
        annual_coupon_pct: f64,
        periods_per_year: f64,
    },
}

impl OutcomeModel {
    /// Bond approximation with a 2% coupon over 252 trading days.
    pub fn bond_default() -> Self {
        OutcomeModel::BondDurationApprox {
            annual_coupon_pct: 2.0,
            periods_per_year: 252.0,
        }
    }

    fn validate(&self) -> Result<(), StatsError> {
        if let OutcomeModel::BondDurationApprox {
            annual_coupon_pct,
            periods_per_year,
        } = *self
        {
            if !annual_coupon_pct.is_finite() || !(periods_per_year.is_finite() && periods_per_year > 0.0) {
                return Err(StatsError::InvalidParameter(format!(
                    "bond model needs a finite coupon and positive periods per year, got {annual_coupon_pct} and {periods_per_year}"
                )));
            }
        }
        Ok(())
    }

    /// Outcome for one (current, future) pair over `horizon` steps.
    pub fn outcome(&self, current: f64, future: f64, horizon: usize) -> Option<f64> {
        match *self {
            OutcomeModel::Change => Some(future - current),
            OutcomeModel::PercentReturn => {
                (current != 0.0).then(|| (future / current - 1.0) * 100.0)
            }
            OutcomeModel::BondDurationApprox {
                annual_coupon_pct,
                periods_per_year,
            } => {
                let duration = bond_duration(current);
                let carry = annual_coupon_pct * horizon as f64 / periods_per_year;
                Some(duration * (current - future) + carry)
            }
        }
    }
}

/// Approximate modified duration (years) at a given yield (%).
pub fn bond_duration(yield_pct: f64) -> f64 {
    (6.0 + (yield_pct - 2.0) * 2.0).clamp(5.0, 10.0)
}

/// Pair each score with the underlying's outcome `horizon_steps` later.
///
/// Scores are matched to the underlying by exact date. Scores with no
/// matching date, without a full horizon ahead, or for which the model has
/// no defined outcome are dropped.
pub fn forward_observations(
    scores: &TimeSeries,
    underlying: &TimeSeries,
    horizon_steps: usize,
    model: OutcomeModel,
) -> Result<Vec<ScoredObservation>, StatsError> {
    if horizon_steps == 0 {
        return Err(StatsError::InvalidParameter(
            "forward horizon must be at least 1 step".into(),
        ));
    }
    model.validate()?;

    let points = underlying.points();
    Ok(scores
        .points()
        .iter()
        .filter_map(|s| {
            let idx = points.binary_search_by(|p| p.date.cmp(&s.date)).ok()?;
            let current = points[idx].value;
            let future = points.get(idx + horizon_steps)?.value;
            Some(ScoredObservation {
                date: s.date,
                score: s.value,
                forward_return: model.outcome(current, future, horizon_steps)?,
                forward_change: future - current,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn duration_is_clamped() {
        assert_eq!(bond_duration(2.0), 6.0);
        assert_eq!(bond_duration(1.0), 5.0);
        assert_eq!(bond_duration(10.0), 10.0);
        assert_approx(bond_duration(2.5), 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bond_return_rewards_falling_yield() {
        let model = OutcomeModel::bond_default();
        // y 2.5 → 2.3 over 20 days: 7 * 0.2 + 2 * 20 / 252
        let r = model.outcome(2.5, 2.3, 20).unwrap();
        assert_approx(r, 7.0 * 0.2 + 40.0 / 252.0, 1e-9);
    }

    #[test]
    fn percent_return_skips_zero_base() {
        assert_eq!(OutcomeModel::PercentReturn.outcome(0.0, 5.0, 1), None);
        assert_approx(
            OutcomeModel::PercentReturn.outcome(100.0, 110.0, 1).unwrap(),
            10.0,
            1e-9,
        );
    }

    #[test]
    fn forward_join_drops_unmatched_and_tail() {
        let underlying = make_series("yield", &[3.0, 2.9, 2.8, 2.7, 2.6]);
        // Scores for the first four dates plus one beyond the underlying
        let scores = make_series("score", &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        let obs = forward_observations(&scores, &underlying, 2, OutcomeModel::Change).unwrap();
        assert_eq!(obs.len(), 3);
        assert_eq!(obs[0].score, 10.0);
        assert_approx(obs[0].forward_return, -0.2, 1e-9);
        assert_approx(obs[0].forward_change, -0.2, 1e-9);
    }

    #[test]
    fn zero_horizon_and_bad_model_are_rejected() {
        let s = make_series("s", &[1.0, 2.0, 3.0]);
        assert!(forward_observations(&s, &s, 0, OutcomeModel::Change).is_err());
        let bad = OutcomeModel::BondDurationApprox {
            annual_coupon_pct: 2.0,
            periods_per_year: 0.0,
        };
        assert!(forward_observations(&s, &s, 1, bad).is_err());
    }
}
