//! TimeSeries: a named, validated sequence of dated observations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// One dated value of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A named series of observations, strictly increasing by date.
///
/// The constructor is the only validation point: every downstream
/// component assumes dates are strictly increasing, unique, and every
/// value is finite. Instances are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    key: String,
    points: Vec<Observation>,
}

impl TimeSeries {
    /// Build and validate a series.
    ///
    /// Rejects an empty key, non-finite values, and dates that are not
    /// strictly increasing (which also rules out duplicates). An empty
    /// point list is valid; operations that need data report it.
    pub fn new(key: impl Into<String>, points: Vec<Observation>) -> Result<Self, StatsError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(StatsError::InvalidSeries {
                key,
                reason: "series key is empty".into(),
            });
        }

        for (i, point) in points.iter().enumerate() {
            if !point.value.is_finite() {
                return Err(StatsError::InvalidSeries {
                    key,
                    reason: format!("non-finite value {} on {}", point.value, point.date),
                });
            }
            if i > 0 {
                let prev = points[i - 1].date;
                if point.date == prev {
                    return Err(StatsError::InvalidSeries {
                        key,
                        reason: format!("duplicate date {}", point.date),
                    });
                }
                if point.date < prev {
                    return Err(StatsError::InvalidSeries {
                        key,
                        reason: format!("date {} follows later date {prev}", point.date),
                    });
                }
            }
        }

        Ok(Self { key, points })
    }

    /// Convenience constructor from `(date, value)` pairs.
    pub fn from_pairs(
        key: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, StatsError> {
        let points = pairs
            .into_iter()
            .map(|(date, value)| Observation::new(date, value))
            .collect();
        Self::new(key, points)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Values in date order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.points.last()
    }

    /// Value observed exactly on `date`.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.date.cmp(&date))
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Latest observation on or before `date` (as-of lookup).
    pub fn value_as_of(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| self.points[i].value)
    }
}

impl<'de> Deserialize<'de> for TimeSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            key: String,
            points: Vec<Observation>,
        }

        let raw = Raw::deserialize(deserializer)?;
        TimeSeries::new(raw.key, raw.points).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn accepts_strictly_increasing_dates() {
        let ts = TimeSeries::from_pairs("cpi", [(d(2024, 1, 31), 0.3), (d(2024, 2, 29), 0.7)])
            .unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.key(), "cpi");
        assert_eq!(ts.latest().unwrap().value, 0.7);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = TimeSeries::from_pairs("m1", [(d(2024, 1, 31), 1.0), (d(2024, 1, 31), 2.0)])
            .unwrap_err();
        assert!(matches!(err, StatsError::InvalidSeries { ref key, .. } if key == "m1"));
        assert!(err.to_string().contains("duplicate date"));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let err = TimeSeries::from_pairs("m2", [(d(2024, 2, 1), 1.0), (d(2024, 1, 1), 2.0)])
            .unwrap_err();
        assert!(err.to_string().contains("follows later date"));
    }

    #[test]
    fn rejects_nan_values() {
        let err = TimeSeries::from_pairs("pmi", [(d(2024, 1, 1), f64::NAN)]).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn rejects_blank_key() {
        assert!(TimeSeries::from_pairs("  ", [(d(2024, 1, 1), 1.0)]).is_err());
    }

    #[test]
    fn empty_series_is_valid() {
        let ts = TimeSeries::new("gdp", vec![]).unwrap();
        assert!(ts.is_empty());
        assert!(ts.latest().is_none());
    }

    #[test]
    fn as_of_lookup_takes_latest_prior_value() {
        let ts = TimeSeries::from_pairs(
            "gdp",
            [(d(2024, 3, 31), 5.3), (d(2024, 6, 30), 4.7), (d(2024, 9, 30), 4.6)],
        )
        .unwrap();
        assert_eq!(ts.value_as_of(d(2024, 3, 1)), None);
        assert_eq!(ts.value_as_of(d(2024, 3, 31)), Some(5.3));
        assert_eq!(ts.value_as_of(d(2024, 8, 15)), Some(4.7));
        assert_eq!(ts.value_on(d(2024, 8, 15)), None);
        assert_eq!(ts.value_on(d(2024, 9, 30)), Some(4.6));
    }

    #[test]
    fn deserialization_validates() {
        let ok = r#"{"key":"cpi","points":[{"date":"2024-01-31","value":0.3}]}"#;
        assert!(serde_json::from_str::<TimeSeries>(ok).is_ok());

        let bad = r#"{"key":"cpi","points":[
            {"date":"2024-02-29","value":0.3},
            {"date":"2024-01-31","value":0.1}]}"#;
        assert!(serde_json::from_str::<TimeSeries>(bad).is_err());
    }
}
