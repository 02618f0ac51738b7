//! Reporting and export: JSON and CSV artifact generation.
//!
//! Provides the persisted forms of an analysis run:
//! - **JSON**: the full report with schema versioning
//! - **CSV**: the correlation ranking, the alert list and the window snapshots
//! - **Snapshot JSON**: a bare `{key: [{date, value}]}` map that loads back
//!   through `Snapshot::from_json_str`
//!
//! Reports carry a `schema_version`. Versions newer than this build are
//! rejected on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use macrolab_core::anomaly::AlertEvent;
use macrolab_core::correlation::CorrelationEntry;
use macrolab_core::stats::StatSnapshot;
use macrolab_core::Observation;

use crate::analysis::{AnalysisReport, SCHEMA_VERSION};
use crate::snapshot::Snapshot;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize AnalysisReport to JSON")
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<AnalysisReport> {
    let report: AnalysisReport =
        serde_json::from_str(json).context("failed to deserialize AnalysisReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Serialize a snapshot as a bare key → observations map.
pub fn export_snapshot_json(snapshot: &Snapshot) -> Result<String> {
    let map: BTreeMap<&str, &[Observation]> = snapshot
        .keys()
        .filter_map(|k| snapshot.get(k).map(|ts| (k, ts.points())))
        .collect();
    serde_json::to_string_pretty(&map).context("failed to serialize snapshot to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: series_a, series_b, coefficient, sample_size, strength
pub fn export_correlations_csv(entries: &[CorrelationEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["series_a", "series_b", "coefficient", "sample_size", "strength"])?;
    for e in entries {
        wtr.write_record([
            e.series_a.as_str(),
            e.series_b.as_str(),
            &format!("{:.6}", e.coefficient),
            &e.sample_size.to_string(),
            e.strength().as_str(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: series_key, kind, severity, date, value, message
pub fn export_alerts_csv(alerts: &[AlertEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["series_key", "kind", "severity", "date", "value", "message"])?;
    for a in alerts {
        wtr.write_record([
            a.series_key.as_str(),
            a.kind.as_str(),
            a.severity.as_str(),
            &a.date.to_string(),
            &format!("{:.6}", a.value),
            a.message.as_str(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per series with its percentile and z-score side by side.
pub fn export_snapshots_csv(percentiles: &[StatSnapshot], zscores: &[StatSnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "series_key",
        "date",
        "value",
        "percentile",
        "z_score",
        "window_mean",
        "window_std",
        "window_len",
    ])?;
    for p in percentiles {
        let z = zscores
            .iter()
            .find(|z| z.series_key == p.series_key)
            .map(|z| format!("{:.6}", z.statistic_value))
            .unwrap_or_default();
        wtr.write_record([
            p.series_key.as_str(),
            &p.date.to_string(),
            &format!("{:.6}", p.current_value),
            &format!("{:.2}", p.statistic_value),
            &z,
            &format!("{:.6}", p.window_mean),
            &format!("{:.6}", p.window_std),
            &p.window_len.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one analysis run.
///
/// Creates `{dataset_hash[..12]}_{timestamp}/` under `output_dir` holding
/// `report.json`, `correlations.csv`, `alerts.csv` and `snapshots.csv`.
/// Returns the created directory.
pub fn save_artifacts(report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf> {
    let short_hash: String = report.dataset_hash.chars().take(12).collect();
    let dirname = format!(
        "{}_{}",
        short_hash,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(
        run_dir.join("correlations.csv"),
        export_correlations_csv(&report.correlations)?,
    )?;
    std::fs::write(run_dir.join("alerts.csv"), export_alerts_csv(&report.alerts)?)?;
    std::fs::write(
        run_dir.join("snapshots.csv"),
        export_snapshots_csv(&report.percentiles, &report.zscores)?,
    )?;

    Ok(run_dir)
}

/// Load a report from an artifact directory's `report.json`.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
