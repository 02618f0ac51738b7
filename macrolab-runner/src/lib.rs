//! MacroLab Runner: host-side orchestration over `macrolab-core`.
//!
//! This crate provides:
//! - Snapshot loading from keyed JSON (file, envelope, or per-key directory)
//! - TOML analysis configuration with dashboard defaults
//! - Parallel all-pairs correlation and all-series alert scans
//! - Report assembly with per-section skips and a dataset fingerprint
//! - JSON / CSV export with schema versioning
//! - Deterministic synthetic snapshots

pub mod analysis;
pub mod config;
pub mod export;
pub mod parallel;
pub mod snapshot;
pub mod synthetic;

pub use analysis::{
    require_series, run_analysis, run_from_files, run_lead_lag, AnalysisReport, KeyedBacktest,
    KeyedTrendRegime, RunError, SkippedSection, SCHEMA_VERSION,
};
pub use config::{AnalysisConfig, BacktestSpec, ConfigError, RegimeKeys};
pub use export::{
    export_alerts_csv, export_correlations_csv, export_json, export_snapshot_json,
    export_snapshots_csv, import_json, load_artifacts, save_artifacts,
};
pub use parallel::{par_correlate_all, par_scan_all, run_in_pool};
pub use snapshot::{Snapshot, SnapshotError};
pub use synthetic::{synthetic_series, synthetic_snapshot};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn snapshot_is_send_sync() {
        assert_send::<Snapshot>();
        assert_sync::<Snapshot>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<AnalysisReport>();
        assert_sync::<AnalysisReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<AnalysisConfig>();
        assert_sync::<AnalysisConfig>();
        assert_send::<BacktestSpec>();
        assert_sync::<BacktestSpec>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<SnapshotError>();
        assert_sync::<SnapshotError>();
    }
}
