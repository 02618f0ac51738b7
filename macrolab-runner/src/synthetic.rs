//! Deterministic synthetic snapshots for demos, tests and benchmarks.
//!
//! Each key gets a monthly random walk seeded from `blake3(key)`, so the
//! same key always produces the same series regardless of which other keys
//! are requested alongside it. Values are rounded to two decimals, like the
//! published macro figures they stand in for.

use chrono::{Months, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use macrolab_core::{Observation, StatsError, TimeSeries};

use crate::snapshot::Snapshot;

/// Starting level and per-step volatility for a few well-known keys.
fn profile(key: &str) -> (f64, f64) {
    match key {
        "pmi" => (50.0, 0.6),
        "cpi" => (2.0, 0.2),
        "ppi" => (0.0, 0.8),
        "gdp" => (5.5, 0.3),
        "lpr_5y" => (4.5, 0.05),
        "bond_yield" => (2.8, 0.05),
        _ => (100.0, 2.0),
    }
}

/// Monthly random walk of `periods` points for one key.
///
/// Fails only on an empty key.
pub fn synthetic_series(key: &str, start: NaiveDate, periods: usize) -> Result<TimeSeries, StatsError> {
    let seed: [u8; 32] = *blake3::hash(key.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);
    let (mut level, step) = profile(key);

    let points = (0..periods)
        .map_while(|i| {
            let date = start.checked_add_months(Months::new(u32::try_from(i).ok()?))?;
            level += rng.gen_range(-step..step);
            Some(Observation::new(date, (level * 100.0).round() / 100.0))
        })
        .collect();

    TimeSeries::new(key, points)
}

/// A snapshot holding one synthetic series per key.
pub fn synthetic_snapshot(
    keys: &[&str],
    start: NaiveDate,
    periods: usize,
) -> Result<Snapshot, StatsError> {
    let series = keys
        .iter()
        .map(|k| synthetic_series(k, start, periods))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Snapshot::from_series(series))
}
