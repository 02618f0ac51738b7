//! MacroLab CLI: statistics over macro and market snapshots.
//!
//! Commands:
//! - `analyze`: run every configured analysis and print the report
//! - `correlate`: ranked all-pairs correlation, filtered by `|r|`
//! - `alerts`: severity-ranked alert scan across every series
//! - `lead-lag`: one lead-lag pair, optionally with a shift correlogram
//! - `synthetic`: write a deterministic synthetic snapshot
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use macrolab_core::correlation::{
    filter_by_strength, top_correlations, CorrelationEntry, TopCorrelations,
    DEFAULT_MIN_ABS_CORRELATION,
};
use macrolab_core::lead_lag::{
    best_shift, cross_correlogram, CorrelogramPoint, LeadLagPair, LeadLagResult,
};
use macrolab_runner::{
    export_snapshot_json, par_correlate_all, par_scan_all, require_series, run_analysis,
    run_lead_lag, save_artifacts, synthetic_snapshot, AnalysisConfig, Snapshot,
};

#[derive(Parser)]
#[command(
    name = "macrolab",
    about = "MacroLab CLI: correlation, lead-lag, regime and alert statistics"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SnapshotArg {
    /// Snapshot JSON file, or a directory with one <key>.json per series.
    #[arg(long)]
    snapshot: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured analysis over a snapshot.
    Analyze {
        #[command(flatten)]
        input: SnapshotArg,

        /// TOML analysis config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also save report.json and CSV artifacts under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Worker threads (overrides the config).
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Rank all pairs by absolute correlation.
    Correlate {
        #[command(flatten)]
        input: SnapshotArg,

        /// Minimum |r| for the filtered list.
        #[arg(long, default_value_t = DEFAULT_MIN_ABS_CORRELATION)]
        min_abs: f64,

        /// Strongest positive and negative pairs to list.
        #[arg(long, default_value_t = 2)]
        top: usize,
    },
    /// Scan every series for extreme, deviating, or trending readings.
    Alerts {
        #[command(flatten)]
        input: SnapshotArg,

        /// Recent window for percentile and volatility.
        #[arg(long, default_value_t = 60)]
        window: usize,
    },
    /// Correlate a lead series against a shifted lag series.
    LeadLag {
        #[command(flatten)]
        input: SnapshotArg,

        #[arg(long)]
        lead: String,

        #[arg(long)]
        lag: String,

        /// Lead in observation steps.
        #[arg(long)]
        shift: usize,

        /// Negate the lead before correlating.
        #[arg(long, default_value_t = false)]
        invert: bool,

        /// Also report the correlogram for shifts 1..=N and the best shift.
        #[arg(long)]
        scan_to: Option<usize>,
    },
    /// Write a deterministic synthetic snapshot.
    Synthetic {
        /// Comma-separated series keys.
        #[arg(long, value_delimiter = ',', required = true)]
        keys: Vec<String>,

        /// Monthly observations per series.
        #[arg(long, default_value_t = 120)]
        periods: usize,

        /// First observation date (YYYY-MM-DD).
        #[arg(long, default_value = "2015-01-01")]
        start: String,

        /// Output file.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output_dir,
            threads,
        } => run_analyze_cmd(&input.snapshot, config.as_deref(), output_dir.as_deref(), threads),
        Commands::Correlate {
            input,
            min_abs,
            top,
        } => run_correlate_cmd(&input.snapshot, min_abs, top),
        Commands::Alerts { input, window } => run_alerts_cmd(&input.snapshot, window),
        Commands::LeadLag {
            input,
            lead,
            lag,
            shift,
            invert,
            scan_to,
        } => run_lead_lag_cmd(&input.snapshot, lead, lag, shift, invert, scan_to),
        Commands::Synthetic {
            keys,
            periods,
            start,
            out,
        } => run_synthetic_cmd(&keys, periods, &start, &out),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let snapshot = Snapshot::load(path)
        .with_context(|| format!("failed to load snapshot {}", path.display()))?;
    info!(
        series = snapshot.len(),
        dropped_nulls = snapshot.dropped_nulls(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn run_analyze_cmd(
    snapshot_path: &Path,
    config_path: Option<&Path>,
    output_dir: Option<&Path>,
    threads: Option<usize>,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let mut config = match config_path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if threads.is_some() {
        config.threads = threads;
    }

    let report = run_analysis(&snapshot, &config)?;
    for skip in &report.skipped {
        info!(section = %skip.section, reason = %skip.reason, "skipped");
    }
    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
    }
    print_json(&report)
}

#[derive(Serialize)]
struct CorrelateOutput {
    min_abs: f64,
    filtered: Vec<CorrelationEntry>,
    top: TopCorrelations,
}

fn run_correlate_cmd(snapshot_path: &Path, min_abs: f64, top: usize) -> Result<()> {
    if !(0.0..=1.0).contains(&min_abs) {
        bail!("--min-abs must be within [0, 1], got {min_abs}");
    }
    let snapshot = load_snapshot(snapshot_path)?;
    let ranked = par_correlate_all(&snapshot.series());
    print_json(&CorrelateOutput {
        min_abs,
        filtered: filter_by_strength(&ranked, min_abs),
        top: top_correlations(&ranked, top),
    })
}

fn run_alerts_cmd(snapshot_path: &Path, window: usize) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let alerts = par_scan_all(&snapshot.series(), window)?;
    info!(alerts = alerts.len(), "scan complete");
    print_json(&alerts)
}

#[derive(Serialize)]
struct LeadLagOutput {
    result: LeadLagResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlogram: Option<Vec<CorrelogramPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best_shift: Option<CorrelogramPoint>,
}

fn run_lead_lag_cmd(
    snapshot_path: &Path,
    lead: String,
    lag: String,
    shift: usize,
    invert: bool,
    scan_to: Option<usize>,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let mut pair = LeadLagPair::new(lead, lag, shift);
    pair.invert_lead = invert;

    let result = run_lead_lag(&snapshot, &pair)?;
    let correlogram = match scan_to {
        Some(max) => {
            let lead = require_series(&snapshot, &pair.lead_key)?;
            let lag = require_series(&snapshot, &pair.lag_key)?;
            Some(cross_correlogram(lead, lag, 1..=max, invert)?)
        }
        None => None,
    };
    let best = correlogram.as_deref().and_then(best_shift);

    print_json(&LeadLagOutput {
        result,
        correlogram,
        best_shift: best,
    })
}

fn run_synthetic_cmd(keys: &[String], periods: usize, start: &str, out: &Path) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start date '{start}'"))?;
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let snapshot = synthetic_snapshot(&key_refs, start, periods)?;

    std::fs::write(out, export_snapshot_json(&snapshot)?)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(
        series = snapshot.len(),
        periods,
        out = %out.display(),
        dataset = %snapshot.dataset_hash(),
        "synthetic snapshot written"
    );
    Ok(())
}
