//! Inference module
//!
//! Provides:
//! - A shared, read-only [`Predictor`] over a loaded model artifact
//! - Single-vector and raw-series (batch) prediction
//! - CSV output of batch predictions
//! - m/s to km/s conversion for display

mod predictor;

pub use predictor::{predictions_frame, write_predictions, Prediction, Predictor};

use crate::features::{assemble_features, FeatureVector};
use chrono::{Datelike, NaiveDate};

/// Convert a speed in m/s to km/s
#[inline]
pub fn ms_to_kms(ms: f64) -> f64 {
    ms / 1000.0
}

/// Feature vector for hand-entered values, with calendar features taken from `date`
pub fn features_for_date(uwnd: f64, vwnd: f64, lags: [f64; 3], date: NaiveDate) -> FeatureVector {
    assemble_features(uwnd, vwnd, lags, date.ordinal(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kms_conversion() {
        assert_eq!(ms_to_kms(1000.0), 1.0);
        assert_eq!(ms_to_kms(0.0), 0.0);
        let ms = 12.3456;
        assert!((ms_to_kms(ms) * 1000.0 - ms).abs() < 1e-12);
    }

    #[test]
    fn test_features_for_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let v = features_for_date(1.0, 2.0, [3.0, 6.0, 9.0], date);
        assert_eq!(v, [1.0, 2.0, 3.0, 6.0, 9.0, 6.0, 366.0, 12.0]);
    }
}
