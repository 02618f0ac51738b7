//! Investment-clock axis builder.
//!
//! Maps raw macro readings onto the growth (x) and inflation (y) axes that
//! [`classify_trajectory`](super::classify_trajectory) expects:
//!
//! - growth = 0.7·(PMI − 50)·20 + 0.3·(GDP − 5)·20
//! - inflation = 0.6·(CPI − 2)·33 + 0.4·PPI·10
//!
//! Both are clamped to ±100. GDP defaults to 5 (neutral) and PPI to 0 when
//! the series is missing or has no observation yet.

use serde::{Deserialize, Serialize};

use super::quadrant::{classify_trajectory, AxisPoint, RegimeState, AXIS_LIMIT};
use crate::domain::TimeSeries;
use crate::error::StatsError;

pub const PMI_NEUTRAL: f64 = 50.0;
pub const GDP_NEUTRAL: f64 = 5.0;
pub const CPI_TARGET: f64 = 2.0;
pub const PPI_NEUTRAL: f64 = 0.0;

/// Fewest PMI and CPI observations for a clock reading.
pub const MIN_CLOCK_OBSERVATIONS: usize = 6;

/// One month of macro inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockReading {
    pub pmi: f64,
    pub cpi: f64,
    pub gdp: Option<f64>,
    pub ppi: Option<f64>,
}

impl ClockReading {
    pub fn growth(&self) -> f64 {
        growth_score(self.pmi, self.gdp)
    }

    pub fn inflation(&self) -> f64 {
        inflation_score(self.cpi, self.ppi)
    }
}

/// Growth axis: PMI weighted 0.7, GDP 0.3, each scaled ×20 around neutral.
pub fn growth_score(pmi: f64, gdp: Option<f64>) -> f64 {
    let pmi_score = (pmi - PMI_NEUTRAL) * 20.0;
    let gdp_score = (gdp.unwrap_or(GDP_NEUTRAL) - GDP_NEUTRAL) * 20.0;
    (0.7 * pmi_score + 0.3 * gdp_score).clamp(-AXIS_LIMIT, AXIS_LIMIT)
}

/// Inflation axis: CPI weighted 0.6 (×33 around 2%), PPI 0.4 (×10).
pub fn inflation_score(cpi: f64, ppi: Option<f64>) -> f64 {
    let cpi_score = (cpi - CPI_TARGET) * 33.0;
    let ppi_score = ppi.unwrap_or(PPI_NEUTRAL) * 10.0;
    (0.6 * cpi_score + 0.4 * ppi_score).clamp(-AXIS_LIMIT, AXIS_LIMIT)
}

/// Axis points on every PMI date that has a CPI reading on or before it.
///
/// CPI, GDP and PPI are joined as-of: the latest observation on or before
/// the PMI date is used.
pub fn clock_history(
    pmi: &TimeSeries,
    cpi: &TimeSeries,
    gdp: Option<&TimeSeries>,
    ppi: Option<&TimeSeries>,
) -> Vec<AxisPoint> {
    pmi.points()
        .iter()
        .filter_map(|p| {
            let reading = ClockReading {
                pmi: p.value,
                cpi: cpi.value_as_of(p.date)?,
                gdp: gdp.and_then(|s| s.value_as_of(p.date)),
                ppi: ppi.and_then(|s| s.value_as_of(p.date)),
            };
            Some(AxisPoint::new(p.date, reading.growth(), reading.inflation()))
        })
        .collect()
}

/// Current investment-clock regime from raw macro series.
///
/// Fails with `InsufficientData` when PMI or CPI has fewer than
/// [`MIN_CLOCK_OBSERVATIONS`] points.
pub fn investment_clock(
    pmi: &TimeSeries,
    cpi: &TimeSeries,
    gdp: Option<&TimeSeries>,
    ppi: Option<&TimeSeries>,
) -> Result<RegimeState, StatsError> {
    let shortest = pmi.len().min(cpi.len());
    if shortest < MIN_CLOCK_OBSERVATIONS {
        return Err(StatsError::insufficient(
            "investment_clock",
            MIN_CLOCK_OBSERVATIONS,
            shortest,
        ));
    }
    classify_trajectory(&clock_history(pmi, cpi, gdp, ppi))
}
