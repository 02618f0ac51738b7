//! Snapshot loading: keyed JSON series into validated `TimeSeries`.
//!
//! Accepted layouts:
//! 1. A bare map `{ "cpi": [{"date": "2024-01-01", "value": 0.3}, ...], ... }`
//! 2. The dashboard envelope `{ "update_time": ..., "data": { "cpi": [...] } }`
//! 3. A directory with one `<key>.json` array per series
//!
//! Dates are `YYYY-MM-DD` or `YYYY-MM` (first of the month). Observations
//! with a `null` value are dropped and counted; everything else goes through
//! `TimeSeries::new`, so unsorted, duplicate, or non-finite data is rejected
//! here rather than deep inside an analysis.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use macrolab_core::{Observation, StatsError, TimeSeries};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("series '{key}': unparseable date '{date}'")]
    BadDate { key: String, date: String },

    #[error(transparent)]
    InvalidSeries(#[from] StatsError),
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSnapshot {
    Envelope { data: BTreeMap<String, Vec<RawPoint>> },
    Bare(BTreeMap<String, Vec<RawPoint>>),
}

/// An immutable, validated set of series keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    series: BTreeMap<String, TimeSeries>,
    dropped_nulls: usize,
}

impl Snapshot {
    /// Build a snapshot from already-validated series. Later duplicates of a
    /// key replace earlier ones.
    pub fn from_series(series: impl IntoIterator<Item = TimeSeries>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|ts| (ts.key().to_string(), ts))
                .collect(),
            dropped_nulls: 0,
        }
    }

    /// Parse either the bare map or the `{"data": ...}` envelope.
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let raw = match serde_json::from_str::<RawSnapshot>(json)? {
            RawSnapshot::Envelope { data } => data,
            RawSnapshot::Bare(map) => map,
        };
        let mut snapshot = Snapshot::default();
        for (key, points) in raw {
            snapshot.insert_raw(key, points)?;
        }
        Ok(snapshot)
    }

    /// Read one `*.json` array per key from `dir`; the file stem is the key.
    pub fn load_dir(dir: &Path) -> Result<Self, SnapshotError> {
        let entries = std::fs::read_dir(dir).map_err(|source| SnapshotError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| SnapshotError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|e| e == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut snapshot = Snapshot::default();
        for path in files {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "skipping file with non-UTF-8 name");
                continue;
            };
            let text = read_file(&path)?;
            let points: Vec<RawPoint> = serde_json::from_str(&text)?;
            snapshot.insert_raw(key.to_string(), points)?;
        }
        debug!(dir = %dir.display(), series = snapshot.len(), "loaded snapshot directory");
        Ok(snapshot)
    }

    /// Load from a snapshot file or a per-key directory.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::from_json_str(&read_file(path)?)
        }
    }

    fn insert_raw(&mut self, key: String, points: Vec<RawPoint>) -> Result<(), SnapshotError> {
        let total = points.len();
        let mut observations = Vec::with_capacity(total);
        for point in points {
            let Some(value) = point.value else {
                continue;
            };
            let date = parse_date(&point.date).ok_or_else(|| SnapshotError::BadDate {
                key: key.clone(),
                date: point.date.clone(),
            })?;
            observations.push(Observation::new(date, value));
        }

        let dropped = total - observations.len();
        if dropped > 0 {
            warn!(series = %key, dropped, "dropped observations with null values");
            self.dropped_nulls += dropped;
        }

        let series = TimeSeries::new(key.clone(), observations)?;
        self.series.insert(key, series);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&TimeSeries> {
        self.series.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Series in key order.
    pub fn series(&self) -> Vec<TimeSeries> {
        self.series.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Observations dropped for having a `null` value.
    pub fn dropped_nulls(&self) -> usize {
        self.dropped_nulls
    }

    /// Deterministic BLAKE3 hash over every key, date and value.
    ///
    /// Keys are visited in sorted order, so the hash does not depend on the
    /// layout the snapshot was loaded from.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (key, series) in &self.series {
            hasher.update(key.as_bytes());
            hasher.update(&(series.len() as u64).to_le_bytes());
            for point in series.points() {
                hasher.update(point.date.to_string().as_bytes());
                hasher.update(&point.value.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn read_file(path: &Path) -> Result<String, SnapshotError> {
    std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok())
}
