//! Predictor over a loaded model artifact

use crate::error::{Result, WindError};
use crate::features::{build_features, load_observations, RawObservation, FEATURE_NAMES, N_FEATURES};
use crate::persist::load_model;
use crate::training::TrainedModel;
use chrono::NaiveDateTime;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::ms_to_kms;

/// One batch prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub time: NaiveDateTime,
    /// Predicted wind speed (m/s)
    pub predicted_wind_speed: f64,
}

impl Prediction {
    pub fn kms(&self) -> f64 {
        ms_to_kms(self.predicted_wind_speed)
    }
}

/// Immutable, cheaply clonable handle to a trained model
#[derive(Debug, Clone)]
pub struct Predictor {
    model: Arc<TrainedModel>,
    source: Option<PathBuf>,
}

impl Predictor {
    pub fn new(model: TrainedModel) -> Self {
        Self {
            model: Arc::new(model),
            source: None,
        }
    }

    /// Load the model artifact at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let model = load_model(path)?;
        info!(path = %path.display(), trees = model.regressor().n_trees(), "Model loaded");
        Ok(Self {
            model: Arc::new(model),
            source: Some(path.to_path_buf()),
        })
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Path the model was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Predict wind speed (m/s) from exactly eight values in [`FEATURE_NAMES`] order
    pub fn predict_vector(&self, features: &[f64]) -> Result<f64> {
        if features.len() != N_FEATURES {
            return Err(WindError::ShapeError {
                expected: format!("{} values ordered as {:?}", N_FEATURES, FEATURE_NAMES),
                actual: format!("{} values", features.len()),
            });
        }
        self.model.predict_one(features)
    }

    /// Predict every complete record of a raw series.
    ///
    /// Output is time-ordered; the first three records of the sorted series have
    /// no lag history and get no prediction.
    pub fn predict_batch(&self, raw: &[RawObservation]) -> Result<Vec<Prediction>> {
        let derived = build_features(raw)?;
        debug!(raw = raw.len(), predictable = derived.len(), "Batch prediction");

        derived
            .par_iter()
            .map(|record| {
                Ok(Prediction {
                    time: record.time,
                    predicted_wind_speed: self.predict_vector(&record.feature_vector())?,
                })
            })
            .collect()
    }

    /// Read a raw CSV, predict and write `time,predicted_wind_speed` rows
    pub fn predict_csv(&self, input: &Path, output: &Path) -> Result<Vec<Prediction>> {
        let raw = load_observations(input)?;
        let predictions = self.predict_batch(&raw)?;
        write_predictions(&predictions, output)?;
        Ok(predictions)
    }
}

/// Predictions as a frame with `time` and `predicted_wind_speed` columns
pub fn predictions_frame(predictions: &[Prediction]) -> Result<DataFrame> {
    let times: Vec<String> = predictions.iter().map(|p| p.time.to_string()).collect();
    let values: Vec<f64> = predictions.iter().map(|p| p.predicted_wind_speed).collect();
    let df = df!(
        "time" => times,
        "predicted_wind_speed" => values
    )?;
    Ok(df)
}

pub fn write_predictions(predictions: &[Prediction], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut df = predictions_frame(predictions)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    info!(path = %path.display(), rows = predictions.len(), "Wrote predictions");
    Ok(())
}
