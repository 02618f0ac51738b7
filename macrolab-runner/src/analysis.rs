//! Analysis runner: one snapshot plus one config in, one report out.
//!
//! The runner owns orchestration only: it resolves series keys, turns config
//! fields into explicit engine parameters, fans the all-pairs and all-series
//! work out across the pool, and records every section it could not compute
//! as a [`SkippedSection`] instead of failing the whole report.

use std::path::Path;

use rayon::prelude::*;
use rayon::ThreadPoolBuildError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use macrolab_core::anomaly::AlertEvent;
use macrolab_core::backtest::{backtest_scores, BacktestResult};
use macrolab_core::correlation::{filter_by_strength, top_correlations, CorrelationEntry, TopCorrelations};
use macrolab_core::lead_lag::{analyze_pair, LeadLagPair, LeadLagResult};
use macrolab_core::regime::{investment_clock, trend_regime, RegimeState, TrendRegimeReading};
use macrolab_core::stats::{percentile_snapshot, zscore_snapshot, StatSnapshot};
use macrolab_core::{StatsError, TimeSeries};

use crate::config::{AnalysisConfig, BacktestSpec, ConfigError};
use crate::parallel::{par_correlate_all, par_scan_all, run_in_pool};
use crate::snapshot::{Snapshot, SnapshotError};

/// Current report schema version.
///
/// Bump this when the serialized shape of `AnalysisReport` changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("series '{0}' not found in snapshot")]
    UnknownSeries(String),

    #[error("failed to build thread pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),

    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// A report section that could not be computed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSection {
    pub section: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedTrendRegime {
    pub series_key: String,
    pub reading: TrendRegimeReading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedBacktest {
    pub score_key: String,
    pub underlying_key: String,
    pub result: BacktestResult,
}

/// Everything computed for one snapshot under one config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub dataset_hash: String,
    pub config_fingerprint: String,
    pub series_count: usize,
    /// All pairs, ranked by `|r|` descending.
    pub correlations: Vec<CorrelationEntry>,
    /// Pairs at or above the configured `|r|` threshold.
    pub strong_correlations: Vec<CorrelationEntry>,
    pub top_correlations: TopCorrelations,
    pub percentiles: Vec<StatSnapshot>,
    pub zscores: Vec<StatSnapshot>,
    /// Severity-ranked alerts across every series.
    pub alerts: Vec<AlertEvent>,
    pub lead_lag: Vec<LeadLagResult>,
    pub regime: Option<RegimeState>,
    pub trend_regimes: Vec<KeyedTrendRegime>,
    pub backtests: Vec<KeyedBacktest>,
    pub skipped: Vec<SkippedSection>,
}

impl AnalysisReport {
    pub fn skipped_sections(&self) -> impl Iterator<Item = &str> {
        self.skipped.iter().map(|s| s.section.as_str())
    }
}

/// Resolve `key` or fail with [`RunError::UnknownSeries`].
pub fn require_series<'a>(snapshot: &'a Snapshot, key: &str) -> Result<&'a TimeSeries, RunError> {
    snapshot
        .get(key)
        .ok_or_else(|| RunError::UnknownSeries(key.to_string()))
}

/// Run a single lead-lag pair against a snapshot.
pub fn run_lead_lag(snapshot: &Snapshot, pair: &LeadLagPair) -> Result<LeadLagResult, RunError> {
    let lead = require_series(snapshot, &pair.lead_key)?;
    let lag = require_series(snapshot, &pair.lag_key)?;
    Ok(analyze_pair(pair, lead, lag)?)
}

/// Load both inputs from disk and run the full analysis.
pub fn run_from_files(snapshot: &Path, config: Option<&Path>) -> Result<AnalysisReport, RunError> {
    let snapshot = Snapshot::load(snapshot)?;
    let config = match config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    run_analysis(&snapshot, &config)
}

/// Run every configured analysis over `snapshot`.
///
/// Fails only on an invalid config or a pool that cannot be built; data
/// problems in individual sections end up in `skipped`.
pub fn run_analysis(snapshot: &Snapshot, config: &AnalysisConfig) -> Result<AnalysisReport, RunError> {
    config.validate()?;
    let dataset_hash = snapshot.dataset_hash();
    let config_fingerprint = config.fingerprint()?;
    info!(
        series = snapshot.len(),
        dataset = &dataset_hash[..12],
        "starting analysis"
    );

    let report = run_in_pool(config.threads, || {
        assemble(snapshot, config, dataset_hash, config_fingerprint)
    })??;

    info!(
        alerts = report.alerts.len(),
        skipped = report.skipped.len(),
        "analysis complete"
    );
    Ok(report)
}

fn assemble(
    snapshot: &Snapshot,
    config: &AnalysisConfig,
    dataset_hash: String,
    config_fingerprint: String,
) -> Result<AnalysisReport, RunError> {
    let series = snapshot.series();
    let mut skipped = Vec::new();

    let correlations = par_correlate_all(&series);
    let strong_correlations = filter_by_strength(&correlations, config.min_abs_correlation);
    let top = top_correlations(&correlations, config.top_n);

    let (percentiles, zscores) = window_snapshots(&series, config, &mut skipped);
    let alerts = par_scan_all(&series, config.alert_window)?;

    let lead_lag = config
        .lead_lag_pairs
        .iter()
        .filter_map(|pair| {
            let section = format!("lead_lag:{}->{}", pair.lead_key, pair.lag_key);
            record(&mut skipped, section, run_lead_lag(snapshot, pair))
        })
        .collect();

    let regime = regime_state(snapshot, config, &mut skipped);

    let trend_regimes = config
        .trend_keys
        .iter()
        .filter_map(|key| {
            let reading = require_series(snapshot, key)
                .and_then(|ts| Ok(trend_regime(&ts.values(), &config.trend_regime)?));
            record(&mut skipped, format!("trend_regime:{key}"), reading).map(|reading| {
                KeyedTrendRegime {
                    series_key: key.clone(),
                    reading,
                }
            })
        })
        .collect();

    let backtests = config
        .backtests
        .iter()
        .filter_map(|spec| {
            let section = format!("backtest:{}->{}", spec.score_key, spec.underlying_key);
            record(&mut skipped, section, run_backtest(snapshot, spec, &config.band_edges)).map(
                |result| KeyedBacktest {
                    score_key: spec.score_key.clone(),
                    underlying_key: spec.underlying_key.clone(),
                    result,
                },
            )
        })
        .collect();

    Ok(AnalysisReport {
        schema_version: SCHEMA_VERSION,
        dataset_hash,
        config_fingerprint,
        series_count: series.len(),
        correlations,
        strong_correlations,
        top_correlations: top,
        percentiles,
        zscores,
        alerts,
        lead_lag,
        regime,
        trend_regimes,
        backtests,
        skipped,
    })
}

/// Keep the value, or log and record why the section was skipped.
fn record<T>(skipped: &mut Vec<SkippedSection>, section: String, result: Result<T, RunError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            if matches!(err, RunError::UnknownSeries(_)) {
                debug!(%section, %err, "section skipped");
            } else {
                warn!(%section, %err, "section skipped");
            }
            skipped.push(SkippedSection {
                section,
                reason: err.to_string(),
            });
            None
        }
    }
}

fn window_snapshots(
    series: &[TimeSeries],
    config: &AnalysisConfig,
    skipped: &mut Vec<SkippedSection>,
) -> (Vec<StatSnapshot>, Vec<StatSnapshot>) {
    let computed: Vec<(&str, Result<(StatSnapshot, StatSnapshot), StatsError>)> = series
        .par_iter()
        .map(|ts| {
            let pair = percentile_snapshot(ts, config.window)
                .and_then(|p| Ok((p, zscore_snapshot(ts, config.window)?)));
            (ts.key(), pair)
        })
        .collect();

    let mut percentiles = Vec::with_capacity(computed.len());
    let mut zscores = Vec::with_capacity(computed.len());
    for (key, result) in computed {
        if let Some((p, z)) = record(skipped, format!("snapshot:{key}"), result.map_err(RunError::from)) {
            percentiles.push(p);
            zscores.push(z);
        }
    }
    (percentiles, zscores)
}

fn regime_state(
    snapshot: &Snapshot,
    config: &AnalysisConfig,
    skipped: &mut Vec<SkippedSection>,
) -> Option<RegimeState> {
    let keys = &config.regime;
    let state = require_series(snapshot, &keys.pmi).and_then(|pmi| {
        let cpi = require_series(snapshot, &keys.cpi)?;
        let gdp = keys.gdp.as_deref().and_then(|k| snapshot.get(k));
        let ppi = keys.ppi.as_deref().and_then(|k| snapshot.get(k));
        Ok(investment_clock(pmi, cpi, gdp, ppi)?)
    });
    record(skipped, "regime".to_string(), state)
}

fn run_backtest(
    snapshot: &Snapshot,
    spec: &BacktestSpec,
    band_edges: &[f64],
) -> Result<BacktestResult, RunError> {
    let scores = require_series(snapshot, &spec.score_key)?;
    let underlying = require_series(snapshot, &spec.underlying_key)?;
    Ok(backtest_scores(
        scores,
        underlying,
        spec.horizon_steps,
        spec.outcome,
        band_edges,
    )?)
}
