//! windspeed - Wind speed regression from wind components and lagged history
//!
//! This crate provides an end-to-end regression demo:
//! - Feature building from raw `(time, uwnd, vwnd)` series
//! - Gradient boosted tree training with a chronological holdout
//! - A predictor over the persisted model
//! - CLI and an HTTP form for ad-hoc predictions
//!
//! # Modules
//!
//! - [`features`] - Wind speed, lag and calendar features; CSV input
//! - [`training`] - Boosted regression trees, split, metrics
//! - [`persist`] - Model and metrics artifacts
//! - [`inference`] - Single-vector and batch prediction
//! - [`config`] - Artifact locations
//! - [`server`] - HTTP form and JSON API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod features;
pub mod training;
pub mod persist;
pub mod inference;

// Services
pub mod config;
pub mod server;
pub mod cli;

pub use error::{Result, WindError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, WindError};

    // Features
    pub use crate::features::{
        build_features, load_observations, DerivedRecord, RawObservation, FEATURE_NAMES,
    };

    // Training
    pub use crate::training::{
        train, Hyperparameters, MetricsRecord, TrainedModel, TrainingConfig, TrainingOutcome,
    };

    // Persistence
    pub use crate::persist::{load_model, read_metrics, save_model, write_metrics};

    // Inference
    pub use crate::inference::{ms_to_kms, Prediction, Predictor};

    // Configuration
    pub use crate::config::ArtifactPaths;
}
