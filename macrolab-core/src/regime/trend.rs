//! Trend regime: how long a series has stayed on one side of its moving average.
//!
//! A long run on one side (at least `threshold` observations) marks the
//! series as `Extended`, and the weight given to trend-following signals
//! decays linearly to zero at twice the threshold. A shorter run marks it as
//! `MeanReverting`, with a weight of `1 − 0.3·run/threshold`.

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendRegime {
    Extended,
    MeanReverting,
}

/// Side of the moving average the latest value sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageSide {
    /// Strictly above the moving average.
    AboveAverage,
    /// At or below it.
    BelowAverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendRegimeParams {
    pub ma_period: usize,
    /// Maximum observations walked back when counting the run.
    pub lookback: usize,
    /// Run length at which the series counts as extended.
    pub threshold: usize,
}

impl Default for TrendRegimeParams {
    fn default() -> Self {
        Self {
            ma_period: 60,
            lookback: 120,
            threshold: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendRegimeReading {
    pub regime: TrendRegime,
    pub side: AverageSide,
    /// Consecutive observations, ending at the latest, on `side`.
    pub run_length: usize,
    /// Weight for trend-following signals, in [0, 1].
    pub trend_weight: f64,
    pub moving_average: f64,
}

/// Trailing simple moving average; `None` until `period` values exist.
fn trailing_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(sum / period as f64);
        }
    }
    out
}

/// Classify the trend regime at the last value of `values`.
pub fn trend_regime(
    values: &[f64],
    params: &TrendRegimeParams,
) -> Result<TrendRegimeReading, StatsError> {
    if params.ma_period == 0 || params.lookback == 0 || params.threshold == 0 {
        return Err(StatsError::InvalidParameter(
            "trend regime periods must be at least 1".into(),
        ));
    }
    if values.len() < params.ma_period {
        return Err(StatsError::insufficient(
            "trend_regime",
            params.ma_period,
            values.len(),
        ));
    }

    let ma = trailing_sma(values, params.ma_period);
    let last = values.len() - 1;
    let Some(moving_average) = ma[last] else {
        return Err(StatsError::insufficient(
            "trend_regime",
            params.ma_period,
            values.len(),
        ));
    };
    let above = values[last] > moving_average;

    let run_length = (0..=last)
        .rev()
        .take(params.lookback)
        .take_while(|&i| ma[i].is_some_and(|m| (values[i] > m) == above))
        .count();

    let threshold = params.threshold as f64;
    let run = run_length as f64;
    let (regime, trend_weight) = if run_length >= params.threshold {
        let decay = ((run - threshold) / threshold).min(1.0);
        (TrendRegime::Extended, (1.0 - decay).max(0.0))
    } else {
        (TrendRegime::MeanReverting, 1.0 - run / threshold * 0.3)
    };

    Ok(TrendRegimeReading {
        regime,
        side: if above {
            AverageSide::AboveAverage
        } else {
            AverageSide::BelowAverage
        },
        run_length,
        trend_weight,
        moving_average,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{assert_approx, DEFAULT_EPSILON};

    fn small() -> TrendRegimeParams {
        TrendRegimeParams {
            ma_period: 3,
            lookback: 10,
            threshold: 4,
        }
    }

    #[test]
    fn sma_is_defined_from_period_onward() {
        let ma = trailing_sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(ma[..2], [None, None]);
        assert_approx(ma[2].unwrap(), 2.0, DEFAULT_EPSILON);
        assert_approx(ma[3].unwrap(), 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn steady_rise_is_extended_above_average() {
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let r = trend_regime(&values, &small()).unwrap();
        assert_eq!(r.side, AverageSide::AboveAverage);
        // MA defined from index 2; indices 2..=11 all above → run 10
        assert_eq!(r.run_length, 10);
        assert_eq!(r.regime, TrendRegime::Extended);
        // decay = min(1, (10 - 4) / 4) = 1
        assert_eq!(r.trend_weight, 0.0);
    }

    #[test]
    fn run_is_capped_by_lookback() {
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let params = TrendRegimeParams {
            lookback: 5,
            ..small()
        };
        let r = trend_regime(&values, &params).unwrap();
        assert_eq!(r.run_length, 5);
        assert_eq!(r.regime, TrendRegime::Extended);
        assert_approx(r.trend_weight, 0.75, DEFAULT_EPSILON);
    }

    #[test]
    fn recent_cross_is_mean_reverting() {
        let values = [5.0, 5.0, 5.0, 6.0, 7.0, 8.0, 2.0, 1.0];
        let r = trend_regime(&values, &small()).unwrap();
        assert_eq!(r.side, AverageSide::BelowAverage);
        assert_eq!(r.run_length, 2);
        assert_eq!(r.regime, TrendRegime::MeanReverting);
        assert_approx(r.trend_weight, 1.0 - 2.0 / 4.0 * 0.3, DEFAULT_EPSILON);
    }

    #[test]
    fn shorter_than_ma_period_is_insufficient() {
        assert!(matches!(
            trend_regime(&[1.0, 2.0], &small()),
            Err(StatsError::InsufficientData { operation: "trend_regime", required: 3, actual: 2 })
        ));
    }

    #[test]
    fn default_params_match_bond_report() {
        let p = TrendRegimeParams::default();
        assert_eq!((p.ma_period, p.lookback, p.threshold), (60, 120, 40));
    }
}
