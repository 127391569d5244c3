//! Holdout evaluation metrics

use crate::error::{Result, WindError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

const MSE_LABEL: &str = "Mean Squared Error (MSE)";
const R2_LABEL: &str = "R² Score";
const MAE_LABEL: &str = "Mean Absolute Error (MAE)";

/// Regression quality on the holdout split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub mse: f64,
    pub r2: f64,
    pub mae: f64,
}

impl MetricsRecord {
    /// Compute MSE, R² and MAE of `y_pred` against `y_true`
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(WindError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(WindError::DataInsufficientError { available: 0, required: 1 });
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Ok(Self {
            mse,
            r2: r2_score(y_true, y_pred),
            mae,
        })
    }

    pub fn rmse(&self) -> f64 {
        self.mse.sqrt()
    }

    /// Three-line report, values at four decimals
    pub fn to_text(&self) -> String {
        format!("{}\n", self)
    }

    /// Parse the report written by [`MetricsRecord::to_text`]
    pub fn from_text(text: &str) -> Result<Self> {
        let mut mse = None;
        let mut r2 = None;
        let mut mae = None;

        for line in text.lines() {
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let slot = match label.trim() {
                MSE_LABEL => &mut mse,
                R2_LABEL => &mut r2,
                MAE_LABEL => &mut mae,
                _ => continue,
            };
            let parsed = value.trim().parse::<f64>().map_err(|e| {
                WindError::SerializationError(format!("bad value for `{}`: {}", label.trim(), e))
            })?;
            *slot = Some(parsed);
        }

        let missing = |label: &str| WindError::SerializationError(format!("metrics report lacks `{}`", label));
        Ok(Self {
            mse: mse.ok_or_else(|| missing(MSE_LABEL))?,
            r2: r2.ok_or_else(|| missing(R2_LABEL))?,
            mae: mae.ok_or_else(|| missing(MAE_LABEL))?,
        })
    }
}

impl fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {:.4}", MSE_LABEL, self.mse)?;
        writeln!(f, "{}: {:.4}", R2_LABEL, self.r2)?;
        write!(f, "{}: {:.4}", MAE_LABEL, self.mae)
    }
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.1, 2.9, 4.2, 4.8];

        let metrics = MetricsRecord::compute(&y_true, &y_pred).unwrap();
        assert!((metrics.mse - 0.022).abs() < 1e-9);
        assert!((metrics.mae - 0.14).abs() < 1e-9);
        assert!(metrics.r2 > 0.9);
        assert!((metrics.rmse() - 0.022f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_prediction() {
        let y = array![2.0, 4.0, 6.0];
        let metrics = MetricsRecord::compute(&y, &y).unwrap();
        assert_eq!(metrics.mse, 0.0);
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.r2, 1.0);
    }

    #[test]
    fn test_constant_target() {
        let y = array![3.0, 3.0];
        assert_eq!(r2_score(&y, &array![3.0, 3.0]), 1.0);
        assert_eq!(r2_score(&y, &array![2.0, 4.0]), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        let err = MetricsRecord::compute(&array![1.0, 2.0], &array![1.0]).unwrap_err();
        assert!(matches!(err, WindError::ShapeError { .. }));
    }

    #[test]
    fn test_text_report() {
        let metrics = MetricsRecord { mse: 0.123456, r2: 0.9, mae: 0.25 };
        let text = metrics.to_text();
        assert_eq!(
            text,
            "Mean Squared Error (MSE): 0.1235\nR² Score: 0.9000\nMean Absolute Error (MAE): 0.2500\n"
        );

        let parsed = MetricsRecord::from_text(&text).unwrap();
        assert_eq!(parsed.r2, 0.9);
        assert_eq!(parsed.mse, 0.1235);
    }

    #[test]
    fn test_text_report_incomplete() {
        let err = MetricsRecord::from_text("R² Score: 0.5\n").unwrap_err();
        assert!(matches!(err, WindError::SerializationError(_)));
    }
}
