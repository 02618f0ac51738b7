//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Alignment: aligned dates are exactly the sorted intersection / union
//! 2. Correlation: symmetric, bounded, self-correlation of 1
//! 3. Percentile: minimum ranks 0, strict maximum ranks 100·(n−1)/n
//! 4. Z-score: constant series score 0 everywhere, never NaN
//! 5. Monotonicity: increasing band means always score 1

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeSet;

use macrolab_core::backtest::monotonicity;
use macrolab_core::correlation::correlate_pair;
use macrolab_core::stats::{percentile_snapshot, rolling_zscores, Window};
use macrolab_core::{align, AlignMode, StatsError, TimeSeries};

// ── Helpers ──────────────────────────────────────────────────────────

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn series_on(key: &str, offsets: &BTreeSet<i64>, value: impl Fn(i64) -> f64) -> TimeSeries {
    TimeSeries::from_pairs(
        key,
        offsets
            .iter()
            .map(|&d| (base() + chrono::Duration::days(d), value(d))),
    )
    .unwrap()
}

fn daily(key: &str, values: &[f64]) -> TimeSeries {
    TimeSeries::from_pairs(
        key,
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (base() + chrono::Duration::days(i as i64), v)),
    )
    .unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_offsets() -> impl Strategy<Value = BTreeSet<i64>> {
    prop::collection::btree_set(0i64..120, 0..40)
}

fn arb_values(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1_000.0..1_000.0_f64, len)
}

// ── 1. Alignment ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn aligned_dates_are_exact_set_operations(a in arb_offsets(), b in arb_offsets()) {
        let sa = series_on("a", &a, |d| d as f64);
        let sb = series_on("b", &b, |d| -(d as f64));

        for (mode, expected) in [
            (AlignMode::Intersection, a.intersection(&b).copied().collect::<Vec<_>>()),
            (AlignMode::Union, a.union(&b).copied().collect::<Vec<_>>()),
        ] {
            let expected: Vec<NaiveDate> = expected
                .into_iter()
                .map(|d| base() + chrono::Duration::days(d))
                .collect();
            match align(&[&sa, &sb], mode) {
                Ok(aligned) => {
                    prop_assert_eq!(&aligned.dates, &expected);
                    prop_assert!(aligned.columns.iter().all(|c| c.len() == expected.len()));
                }
                Err(StatsError::InsufficientData { actual, .. }) => {
                    prop_assert!(expected.len() < 3);
                    prop_assert_eq!(actual, expected.len());
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }
}

// ── 2. Correlation ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn correlation_is_symmetric_and_bounded(
        xs in arb_values(3..40),
        ys in arb_values(3..40),
    ) {
        let a = daily("a", &xs);
        let b = daily("b", &ys);
        let ab = correlate_pair(&a, &b);
        let ba = correlate_pair(&b, &a);
        prop_assert_eq!(ab.coefficient, ba.coefficient);
        prop_assert_eq!(ab.sample_size, xs.len().min(ys.len()));
        prop_assert!((-1.0..=1.0).contains(&ab.coefficient));
    }

    #[test]
    fn self_correlation_is_one_for_non_constant(xs in arb_values(3..40)) {
        let spread = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - xs.iter().cloned().fold(f64::INFINITY, f64::min);
        prop_assume!(spread > 1e-6);
        let a = daily("a", &xs);
        let r = correlate_pair(&a, &a).coefficient;
        prop_assert!((r - 1.0).abs() < 1e-9, "r = {}", r);
    }
}

// ── 3. Percentile boundaries ─────────────────────────────────────────

proptest! {
    #[test]
    fn minimum_ranks_zero_and_strict_maximum_ranks_n_minus_one(
        distinct in prop::collection::btree_set(-10_000i64..10_000, 2..50),
    ) {
        let sorted: Vec<f64> = distinct.iter().map(|&v| v as f64).collect();
        let n = sorted.len() as f64;

        // Put the minimum last
        let mut at_min: Vec<f64> = sorted[1..].to_vec();
        at_min.push(sorted[0]);
        let snap = percentile_snapshot(&daily("m", &at_min), Window::All).unwrap();
        prop_assert_eq!(snap.statistic_value, 0.0);

        // Sorted ascending ends on the strict maximum
        let snap = percentile_snapshot(&daily("m", &sorted), Window::All).unwrap();
        prop_assert!((snap.statistic_value - 100.0 * (n - 1.0) / n).abs() < 1e-9);
    }
}

// ── 4. Z-score degenerate case ───────────────────────────────────────

proptest! {
    #[test]
    fn constant_series_zscores_are_zero(c in -1e6..1e6_f64, n in 1usize..60, window in 1usize..20) {
        let ts = daily("flat", &vec![c; n]);
        for w in [Window::All, Window::Trailing(window)] {
            for (_, z) in rolling_zscores(&ts, w).unwrap() {
                prop_assert_eq!(z, 0.0);
            }
        }
    }
}

// ── 5. Monotonicity ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn increasing_means_score_one(steps in prop::collection::vec(0.001..10.0_f64, 1..10)) {
        let means: Vec<f64> = steps
            .iter()
            .scan(0.0, |acc, s| {
                *acc += s;
                Some(*acc)
            })
            .collect();
        let m = monotonicity(&means);
        prop_assert!(m.is_monotonic);
        prop_assert_eq!(m.score, 1.0);
    }
}
