//! Wind speed, lag and calendar features

use crate::error::{Result, WindError};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Lag periods, in records, taken from the sorted series
pub const LAGS: [usize; 3] = [1, 2, 3];

/// Records at the head of a sorted series that lack a full lag history
pub const WARMUP_RECORDS: usize = 3;

/// Number of model input features
pub const N_FEATURES: usize = 8;

/// Model input features, in the order the regressor consumes them
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "uwnd",
    "vwnd",
    "wind_speed_lag_1",
    "wind_speed_lag_2",
    "wind_speed_lag_3",
    "wind_speed_avg3",
    "day_of_year",
    "month",
];

/// A fixed-order model input
pub type FeatureVector = [f64; N_FEATURES];

/// One raw row of the input series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub time: NaiveDateTime,
    /// Zonal wind component (m/s)
    pub uwnd: f64,
    /// Meridional wind component (m/s)
    pub vwnd: f64,
}

impl RawObservation {
    pub fn new(time: NaiveDateTime, uwnd: f64, vwnd: f64) -> Self {
        Self { time, uwnd, vwnd }
    }
}

/// A raw row with its wind speed magnitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindObservation {
    pub time: NaiveDateTime,
    pub uwnd: f64,
    pub vwnd: f64,
    pub wind_speed: f64,
}

/// A complete record: wind speed plus lag and calendar features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    pub time: NaiveDateTime,
    pub uwnd: f64,
    pub vwnd: f64,
    pub wind_speed: f64,
    pub wind_speed_lag_1: f64,
    pub wind_speed_lag_2: f64,
    pub wind_speed_lag_3: f64,
    pub wind_speed_avg3: f64,
    pub day_of_year: u32,
    pub month: u32,
}

impl DerivedRecord {
    /// Model input for this record, ordered as [`FEATURE_NAMES`]
    pub fn feature_vector(&self) -> FeatureVector {
        [
            self.uwnd,
            self.vwnd,
            self.wind_speed_lag_1,
            self.wind_speed_lag_2,
            self.wind_speed_lag_3,
            self.wind_speed_avg3,
            self.day_of_year as f64,
            self.month as f64,
        ]
    }

    /// The raw fields this record was derived from
    pub fn observation(&self) -> RawObservation {
        RawObservation::new(self.time, self.uwnd, self.vwnd)
    }
}

/// Wind speed magnitude of a (u, v) pair
#[inline]
pub fn wind_speed(uwnd: f64, vwnd: f64) -> f64 {
    (uwnd * uwnd + vwnd * vwnd).sqrt()
}

/// Mean of three lagged speeds
#[inline]
pub fn lag_mean(lag_1: f64, lag_2: f64, lag_3: f64) -> f64 {
    (lag_1 + lag_2 + lag_3) / 3.0
}

/// Assemble a feature vector from individually supplied values
pub fn assemble_features(
    uwnd: f64,
    vwnd: f64,
    lags: [f64; 3],
    day_of_year: u32,
    month: u32,
) -> FeatureVector {
    let [lag_1, lag_2, lag_3] = lags;
    [
        uwnd,
        vwnd,
        lag_1,
        lag_2,
        lag_3,
        lag_mean(lag_1, lag_2, lag_3),
        day_of_year as f64,
        month as f64,
    ]
}

/// Add `wind_speed = sqrt(uwnd² + vwnd²)` to every record.
///
/// A NaN component is treated as a missing value and rejected.
pub fn compute_wind_speed(records: &[RawObservation]) -> Result<Vec<WindObservation>> {
    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            if r.uwnd.is_nan() {
                return Err(WindError::MissingFieldError { field: "uwnd".to_string(), row });
            }
            if r.vwnd.is_nan() {
                return Err(WindError::MissingFieldError { field: "vwnd".to_string(), row });
            }
            Ok(WindObservation {
                time: r.time,
                uwnd: r.uwnd,
                vwnd: r.vwnd,
                wind_speed: wind_speed(r.uwnd, r.vwnd),
            })
        })
        .collect()
}

/// Derive lag and calendar features.
///
/// Input is sorted by time (stable) before lags are taken. The first
/// [`WARMUP_RECORDS`] records of the sorted series have no complete lag
/// history and are not part of the output, so fewer than four records
/// yield an empty result.
pub fn derive_features(records: &[WindObservation]) -> Vec<DerivedRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.time);

    let speeds: Vec<f64> = sorted.iter().map(|r| r.wind_speed).collect();

    sorted
        .iter()
        .enumerate()
        .skip(WARMUP_RECORDS)
        .map(|(i, r)| {
            let [lag_1, lag_2, lag_3] = LAGS.map(|lag| speeds[i - lag]);
            DerivedRecord {
                time: r.time,
                uwnd: r.uwnd,
                vwnd: r.vwnd,
                wind_speed: r.wind_speed,
                wind_speed_lag_1: lag_1,
                wind_speed_lag_2: lag_2,
                wind_speed_lag_3: lag_3,
                wind_speed_avg3: lag_mean(lag_1, lag_2, lag_3),
                day_of_year: r.time.ordinal(),
                month: r.time.month(),
            }
        })
        .collect()
}

/// Raw rows to complete records: [`compute_wind_speed`] then [`derive_features`]
pub fn build_features(records: &[RawObservation]) -> Result<Vec<DerivedRecord>> {
    let with_speed = compute_wind_speed(records)?;
    Ok(derive_features(&with_speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_wind_speed_pythagorean() {
        assert_eq!(wind_speed(3.0, 4.0), 5.0);
        assert_eq!(wind_speed(0.0, 0.0), 0.0);
        assert_eq!(wind_speed(-3.0, -4.0), 5.0);
    }

    #[test]
    fn test_compute_wind_speed_rejects_nan() {
        let records = vec![
            RawObservation::new(day(1), 1.0, 1.0),
            RawObservation::new(day(2), 1.0, f64::NAN),
        ];
        let err = compute_wind_speed(&records).unwrap_err();
        match err {
            WindError::MissingFieldError { field, row } => {
                assert_eq!(field, "vwnd");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_derive_sorts_input() {
        let raw: Vec<RawObservation> = [5, 3, 1, 4, 2]
            .iter()
            .map(|&d| RawObservation::new(day(d), d as f64, 0.0))
            .collect();
        let derived = build_features(&raw).unwrap();

        assert_eq!(derived.len(), 2);
        assert_eq!(derived[0].time, day(4));
        assert_eq!(derived[0].wind_speed_lag_1, 3.0);
        assert_eq!(derived[0].wind_speed_lag_3, 1.0);
        assert_eq!(derived[1].time, day(5));
    }

    #[test]
    fn test_short_series_is_empty() {
        let raw: Vec<RawObservation> = (1..=3)
            .map(|d| RawObservation::new(day(d), 1.0, 1.0))
            .collect();
        assert!(build_features(&raw).unwrap().is_empty());
        assert!(build_features(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_feature_vector_order() {
        let raw: Vec<RawObservation> = (1..=4)
            .map(|d| RawObservation::new(day(d), d as f64, 1.0))
            .collect();
        let record = build_features(&raw).unwrap()[0];
        let v = record.feature_vector();

        assert_eq!(v[0], record.uwnd);
        assert_eq!(v[1], record.vwnd);
        assert_eq!(v[2], record.wind_speed_lag_1);
        assert_eq!(v[5], record.wind_speed_avg3);
        assert_eq!(v[6], 4.0);
        assert_eq!(v[7], 1.0);
    }

    #[test]
    fn test_assemble_matches_record() {
        let raw: Vec<RawObservation> = (1..=4)
            .map(|d| RawObservation::new(day(d), d as f64 * 0.5, 2.0))
            .collect();
        let record = build_features(&raw).unwrap()[0];
        let assembled = assemble_features(
            record.uwnd,
            record.vwnd,
            [record.wind_speed_lag_1, record.wind_speed_lag_2, record.wind_speed_lag_3],
            record.day_of_year,
            record.month,
        );
        assert_eq!(assembled, record.feature_vector());
    }
}
