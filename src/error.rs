//! Error types for the windspeed crate

use thiserror::Error;

/// Result type alias for windspeed operations
pub type Result<T> = std::result::Result<T, WindError>;

/// Main error type for feature building, training and prediction
#[derive(Error, Debug)]
pub enum WindError {
    /// Required input columns are absent or malformed
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Too few complete records to build both a training and a holdout split
    #[error("Insufficient data: {available} complete records, need at least {required}")]
    DataInsufficientError { available: usize, required: usize },

    /// Feature vector has the wrong length
    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    /// No trained model artifact is available
    #[error("Trained model not found at {0}. Train it first with `windspeed train`")]
    ModelNotLoadedError(String),

    /// A raw record lacks one of its wind components
    #[error("Missing field `{field}` in record {row}")]
    MissingFieldError { field: String, row: usize },

    /// Model artifact was written for another feature set or format version
    #[error("Model artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl WindError {
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        WindError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for WindError {
    fn from(err: polars::error::PolarsError) -> Self {
        WindError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for WindError {
    fn from(err: serde_json::Error) -> Self {
        WindError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for WindError {
    fn from(err: bincode::Error) -> Self {
        WindError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for WindError {
    fn from(err: ndarray::ShapeError) -> Self {
        WindError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WindError::SchemaError("missing column `uwnd`".to_string());
        assert_eq!(err.to_string(), "Schema error: missing column `uwnd`");
    }

    #[test]
    fn test_insufficient_display() {
        let err = WindError::DataInsufficientError { available: 1, required: 2 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: 1 complete records, need at least 2"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WindError = io_err.into();
        assert!(matches!(err, WindError::IoError(_)));
    }
}
