//! Feature builder
//!
//! Turns raw `(time, uwnd, vwnd)` rows into model-ready records:
//! - Wind speed magnitude from the two components
//! - Lag features (1, 2 and 3 records back) and their mean
//! - Calendar features (day of year, month)
//!
//! Records without three predecessors in time order are dropped, both for
//! training and for batch prediction.

mod builder;
mod loader;

pub use builder::{
    assemble_features, build_features, compute_wind_speed, derive_features, lag_mean,
    wind_speed, DerivedRecord, FeatureVector, RawObservation, WindObservation, FEATURE_NAMES,
    LAGS, N_FEATURES, WARMUP_RECORDS,
};
pub use loader::{load_csv, load_observations, observations_from_frame, parse_timestamp, REQUIRED_COLUMNS};
