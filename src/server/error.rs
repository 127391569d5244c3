//! Error types for the server

use crate::error::WindError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    ModelNotLoaded(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<WindError> for ServerError {
    fn from(err: WindError) -> Self {
        match err {
            WindError::ModelNotLoadedError(_) | WindError::ModelNotFitted => {
                ServerError::ModelNotLoaded(err.to_string())
            }
            WindError::ShapeError { .. }
            | WindError::SchemaError(_)
            | WindError::MissingFieldError { .. }
            | WindError::DataInsufficientError { .. }
            | WindError::InvalidParameter { .. } => ServerError::BadRequest(err.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::ModelNotLoaded(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_loaded: ServerError = WindError::ModelNotLoadedError("m.bin".into()).into();
        assert_eq!(not_loaded.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let shape: ServerError = WindError::ShapeError {
            expected: "8".into(),
            actual: "7".into(),
        }
        .into();
        assert_eq!(shape.into_response().status(), StatusCode::BAD_REQUEST);

        let io: ServerError = WindError::IoError(std::io::Error::other("disk")).into();
        assert_eq!(io.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
