//! Training pipeline: features, chronological split, fit, holdout evaluation

use crate::error::{Result, WindError};
use crate::features::{build_features, DerivedRecord, RawObservation, FEATURE_NAMES, N_FEATURES};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Instant;
use tracing::{debug, info};

use super::{BoostedTreeRegressor, MetricsRecord, TrainingConfig};

/// A fitted wind speed regressor bound to the feature order it was trained on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    regressor: BoostedTreeRegressor,
    feature_names: Vec<String>,
}

impl TrainedModel {
    pub fn new(regressor: BoostedTreeRegressor) -> Self {
        Self {
            regressor,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn regressor(&self) -> &BoostedTreeRegressor {
        &self.regressor
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Predict wind speed (m/s) for one feature vector in [`FEATURE_NAMES`] order
    pub fn predict_one(&self, features: &[f64]) -> Result<f64> {
        if features.len() != N_FEATURES {
            return Err(WindError::ShapeError {
                expected: format!("{} features {:?}", N_FEATURES, FEATURE_NAMES),
                actual: format!("{} features", features.len()),
            });
        }
        self.regressor
            .predict_one(ndarray::ArrayView1::from(features))
    }

    /// Predict every row of an `n x 8` matrix
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.regressor.predict(x)
    }

    /// Feature importances paired with their names, highest first
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let Some(importances) = self.regressor.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub metrics: MetricsRecord,
    /// Complete records after feature derivation
    pub n_records: usize,
    pub n_train: usize,
    pub n_holdout: usize,
    pub training_time_secs: f64,
}

/// Stack derived records into the model's input matrix and target vector
pub fn to_matrix(records: &[DerivedRecord]) -> Result<(Array2<f64>, Array1<f64>)> {
    let flat: Vec<f64> = records
        .iter()
        .flat_map(|r| r.feature_vector())
        .collect();
    let x = Array2::from_shape_vec((records.len(), N_FEATURES), flat)?;
    let y: Array1<f64> = records.iter().map(|r| r.wind_speed).collect();
    Ok((x, y))
}

fn holdout_size(n: usize, holdout_fraction: f64) -> usize {
    ((n as f64) * holdout_fraction).ceil() as usize
}

fn splits_cleanly(n: usize, holdout_fraction: f64) -> bool {
    let n_holdout = holdout_size(n, holdout_fraction);
    n_holdout > 0 && n_holdout < n
}

/// Smallest record count that leaves both split parts non-empty
pub fn min_records_for_split(holdout_fraction: f64) -> Result<usize> {
    if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
        return Err(WindError::invalid_parameter(
            "holdout_fraction",
            holdout_fraction,
            "must be in (0, 1)",
        ));
    }
    // ceil(n * f) < n holds for every n > 1 / (1 - f)
    let upper = (1.0 / (1.0 - holdout_fraction)).floor() as usize + 1;
    Ok((2..=upper.max(2))
        .find(|&n| splits_cleanly(n, holdout_fraction))
        .unwrap_or(upper.max(2)))
}

/// Split time-ordered records into a leading training part and a trailing holdout.
///
/// The holdout holds `ceil(n * holdout_fraction)` records. Either part ending up
/// empty is a `DataInsufficientError`.
pub fn chronological_split(
    records: &[DerivedRecord],
    holdout_fraction: f64,
) -> Result<(&[DerivedRecord], &[DerivedRecord])> {
    let required = min_records_for_split(holdout_fraction)?;
    let n = records.len();
    if !splits_cleanly(n, holdout_fraction) {
        return Err(WindError::DataInsufficientError {
            available: n,
            required,
        });
    }
    Ok(records.split_at(n - holdout_size(n, holdout_fraction)))
}

/// Train on raw observations
pub fn train(records: &[RawObservation], config: &TrainingConfig) -> Result<TrainingOutcome> {
    config.validate()?;
    let derived = build_features(records)?;
    debug!(raw = records.len(), derived = derived.len(), "Derived features");
    train_on_features(&derived, config)
}

/// Train on already derived records; they are put in time order before splitting
pub fn train_on_features(
    derived: &[DerivedRecord],
    config: &TrainingConfig,
) -> Result<TrainingOutcome> {
    config.validate()?;
    let start = Instant::now();

    let derived: Cow<'_, [DerivedRecord]> = if derived.windows(2).all(|w| w[0].time <= w[1].time) {
        Cow::Borrowed(derived)
    } else {
        let mut sorted = derived.to_vec();
        sorted.sort_by_key(|r| r.time);
        Cow::Owned(sorted)
    };
    let derived = derived.as_ref();

    let (train_part, holdout_part) = chronological_split(derived, config.holdout_fraction)?;
    let (x_train, y_train) = to_matrix(train_part)?;
    let (x_holdout, y_holdout) = to_matrix(holdout_part)?;

    info!(
        train = train_part.len(),
        holdout = holdout_part.len(),
        n_estimators = config.hyperparameters.n_estimators,
        "Training wind speed regressor"
    );

    let mut regressor = BoostedTreeRegressor::new(config.hyperparameters.clone());
    regressor.fit(&x_train, &y_train)?;
    let model = TrainedModel::new(regressor);

    let y_pred = model.predict(&x_holdout)?;
    let metrics = MetricsRecord::compute(&y_holdout, &y_pred)?;
    let training_time_secs = start.elapsed().as_secs_f64();

    info!(
        mse = metrics.mse,
        r2 = metrics.r2,
        mae = metrics.mae,
        secs = training_time_secs,
        "Holdout evaluation"
    );

    Ok(TrainingOutcome {
        model,
        metrics,
        n_records: derived.len(),
        n_train: train_part.len(),
        n_holdout: holdout_part.len(),
        training_time_secs,
    })
}
