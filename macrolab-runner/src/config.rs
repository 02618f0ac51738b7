//! Serializable analysis configuration, loaded from TOML.
//!
//! Every field has a default matching the dashboards, so an empty file is a
//! valid configuration. The engine itself never reads this: the runner
//! turns each field into explicit call parameters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use macrolab_core::anomaly::DEFAULT_RECENT_WINDOW;
use macrolab_core::backtest::{validate_edges, OutcomeModel, DEFAULT_BAND_EDGES};
use macrolab_core::correlation::DEFAULT_MIN_ABS_CORRELATION;
use macrolab_core::lead_lag::LeadLagPair;
use macrolab_core::regime::TrendRegimeParams;
use macrolab_core::stats::Window;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which analyses to run over a snapshot, and with which parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Trailing window for percentile and z-score snapshots.
    pub window: Window,
    /// Recent window for the alert scan.
    pub alert_window: usize,
    /// Minimum `|r|` for the filtered correlation list.
    pub min_abs_correlation: f64,
    /// How many positive and negative entries to keep as "top".
    pub top_n: usize,
    /// Hypothesised lead-lag relationships; pairs with a missing key are skipped.
    pub lead_lag_pairs: Vec<LeadLagPair>,
    /// Series keys feeding the investment clock.
    pub regime: RegimeKeys,
    /// Series to classify as extended or mean-reverting.
    pub trend_keys: Vec<String>,
    pub trend_regime: TrendRegimeParams,
    /// Score-band edges shared by every backtest.
    pub band_edges: Vec<f64>,
    pub backtests: Vec<BacktestSpec>,
    /// Worker threads; `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: Window::All,
            alert_window: DEFAULT_RECENT_WINDOW,
            min_abs_correlation: DEFAULT_MIN_ABS_CORRELATION,
            top_n: 2,
            lead_lag_pairs: default_lead_lag_pairs(),
            regime: RegimeKeys::default(),
            trend_keys: Vec::new(),
            trend_regime: TrendRegimeParams::default(),
            band_edges: DEFAULT_BAND_EDGES.to_vec(),
            backtests: Vec::new(),
            threads: None,
        }
    }
}

/// The five relationships the macro dashboard tracks.
pub fn default_lead_lag_pairs() -> Vec<LeadLagPair> {
    vec![
        LeadLagPair::new("social_financing", "gdp", 6),
        LeadLagPair::new("m1", "sh_index_pe", 4),
        LeadLagPair::new("pmi", "ppi", 2),
        LeadLagPair::new("lpr_5y", "real_estate_invest", 4).inverted(),
        LeadLagPair::new("scissors", "sh_index", 4),
    ]
}

/// Keys of the raw series behind the two clock axes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegimeKeys {
    pub pmi: String,
    pub cpi: String,
    /// Optional growth input; neutral when absent from the snapshot.
    pub gdp: Option<String>,
    /// Optional inflation input; neutral when absent from the snapshot.
    pub ppi: Option<String>,
}

impl Default for RegimeKeys {
    fn default() -> Self {
        Self {
            pmi: "pmi".into(),
            cpi: "cpi".into(),
            gdp: Some("gdp".into()),
            ppi: Some("ppi".into()),
        }
    }
}

/// One score-versus-outcome backtest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSpec {
    pub score_key: String,
    pub underlying_key: String,
    pub horizon_steps: usize,
    #[serde(default = "default_outcome")]
    pub outcome: OutcomeModel,
}

fn default_outcome() -> OutcomeModel {
    OutcomeModel::Change
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject parameters no analysis could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alert_window == 0 {
            return Err(ConfigError::Invalid("alert_window must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.min_abs_correlation) {
            return Err(ConfigError::Invalid(format!(
                "min_abs_correlation must be within [0, 1], got {}",
                self.min_abs_correlation
            )));
        }
        validate_edges(&self.band_edges).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(pair) = self.lead_lag_pairs.iter().find(|p| p.shift == 0) {
            return Err(ConfigError::Invalid(format!(
                "lead-lag pair {} -> {} has a zero shift",
                pair.lead_key, pair.lag_key
            )));
        }
        if let Some(spec) = self.backtests.iter().find(|b| b.horizon_steps == 0) {
            return Err(ConfigError::Invalid(format!(
                "backtest of {} has a zero horizon",
                spec.score_key
            )));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Content hash of the configuration, for pairing reports with settings.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
