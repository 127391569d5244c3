//! Model training module
//!
//! Provides:
//! - Gradient boosted regression trees (XGBoost-style second-order boosting)
//! - Chronological train/holdout split
//! - Holdout metrics (MSE, R², MAE) and their text report

mod config;
mod metrics;
mod trainer;
pub mod xgboost;

pub use config::{Hyperparameters, TrainingConfig};
pub use metrics::{r2_score, MetricsRecord};
pub use trainer::{
    chronological_split, min_records_for_split, to_matrix, train, train_on_features, TrainedModel,
    TrainingOutcome,
};
pub use xgboost::BoostedTreeRegressor;
