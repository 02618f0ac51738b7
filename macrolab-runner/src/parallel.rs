//! Parallel batch execution over independent pairs and series.
//!
//! Each helper fans work out with rayon and then re-sorts with the same
//! comparator the sequential core function uses, so the output is identical
//! to `correlate_all` / `scan_all` regardless of thread count or scheduling.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::info;

use macrolab_core::anomaly::{scan, sort_alerts, AlertEvent};
use macrolab_core::correlation::{correlate_pair, pair_indices, sort_entries, CorrelationEntry};
use macrolab_core::{StatsError, TimeSeries};

/// All-pairs correlation, ranked exactly like `correlate_all`.
pub fn par_correlate_all(series: &[TimeSeries]) -> Vec<CorrelationEntry> {
    let mut entries: Vec<CorrelationEntry> = pair_indices(series.len())
        .into_par_iter()
        .map(|(i, j)| correlate_pair(&series[i], &series[j]))
        .collect();
    sort_entries(&mut entries);
    entries
}

/// Alert scan of every series, ranked exactly like `scan_all`.
///
/// `collect` keeps input order across the per-series batches, so the
/// stable severity sort reproduces the sequential discovery order.
pub fn par_scan_all(
    series: &[TimeSeries],
    recent_window: usize,
) -> Result<Vec<AlertEvent>, StatsError> {
    let batches: Vec<Vec<AlertEvent>> = series
        .par_iter()
        .map(|ts| scan(ts, recent_window))
        .collect::<Result<_, _>>()?;
    let mut alerts: Vec<AlertEvent> = batches.into_iter().flatten().collect();
    sort_alerts(&mut alerts);
    Ok(alerts)
}

/// Build a bounded pool of `threads` workers.
pub fn build_pool(threads: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("macrolab-worker-{i}"))
        .build()
}

/// Run `f` inside a dedicated pool, or on rayon's global pool when `threads`
/// is `None`.
pub fn run_in_pool<T, F>(threads: Option<usize>, f: F) -> Result<T, ThreadPoolBuildError>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match threads {
        Some(n) => {
            let pool = build_pool(n)?;
            info!(threads = n, "running analysis in dedicated pool");
            Ok(pool.install(f))
        }
        None => {
            info!(threads = rayon::current_num_threads(), "running analysis in global pool");
            Ok(f())
        }
    }
}
