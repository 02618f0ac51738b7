//! Criterion benchmarks for MacroLab hot paths.
//!
//! Benchmarks:
//! 1. All-pairs correlation matrix (alignment + Pearson per pair)
//! 2. Lead-lag correlogram over a range of shifts
//! 3. Alert scan across a snapshot of series

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use macrolab_core::anomaly::scan_all;
use macrolab_core::correlation::correlate_all;
use macrolab_core::lead_lag::cross_correlogram;
use macrolab_core::TimeSeries;

// ── Helpers ──────────────────────────────────────────────────────────

/// Monthly series with a per-key phase, some keys missing every 7th month.
fn make_series(n_series: usize, n_points: usize) -> Vec<TimeSeries> {
    let base = chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    (0..n_series)
        .map(|k| {
            let phase = k as f64 * 0.7;
            let pairs = (0..n_points)
                .filter(|i| k % 3 != 0 || i % 7 != 0)
                .map(|i| {
                    let date = base + chrono::Months::new(i as u32);
                    (date, 50.0 + (i as f64 * 0.1 + phase).sin() * 10.0 + k as f64)
                });
            TimeSeries::from_pairs(format!("series_{k:02}"), pairs).unwrap()
        })
        .collect()
}

// ── 1. Correlation matrix ────────────────────────────────────────────

fn bench_correlation_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlate_all");
    for n_series in [10, 30] {
        let series = make_series(n_series, 300);
        group.bench_with_input(BenchmarkId::from_parameter(n_series), &series, |b, s| {
            b.iter(|| correlate_all(black_box(s)))
        });
    }
    group.finish();
}

// ── 2. Lead-lag correlogram ──────────────────────────────────────────

fn bench_correlogram(c: &mut Criterion) {
    let series = make_series(2, 600);
    c.bench_function("cross_correlogram_1_to_24", |b| {
        b.iter(|| cross_correlogram(black_box(&series[0]), black_box(&series[1]), 1..=24, false))
    });
}

// ── 3. Alert scan ────────────────────────────────────────────────────

fn bench_alert_scan(c: &mut Criterion) {
    let series = make_series(40, 240);
    c.bench_function("scan_all_40_series", |b| {
        b.iter(|| scan_all(black_box(&series), 60))
    });
}

criterion_group!(
    benches,
    bench_correlation_matrix,
    bench_correlogram,
    bench_alert_scan
);
criterion_main!(benches);
