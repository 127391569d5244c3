//! Application state shared across handlers

use crate::error::WindError;
use crate::inference::Predictor;
use crate::persist::read_metrics_text;
use tracing::{info, warn};

use super::error::ServerError;
use super::ServerConfig;

/// Shown when no metrics report is on disk
pub const METRICS_UNAVAILABLE: &str = "Metrics not available";

/// Read-only state: the loaded model (or why it failed to load) and its metrics report
pub struct AppState {
    pub config: ServerConfig,
    predictor: std::result::Result<Predictor, String>,
    metrics_text: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Load artifacts named by `config`.
    ///
    /// A missing or unreadable model leaves the server up; prediction routes
    /// then answer 503.
    pub fn new(config: ServerConfig) -> Self {
        let predictor = Predictor::load(&config.artifacts.model).map_err(|e| {
            warn!(path = %config.artifacts.model.display(), error = %e, "Model unavailable");
            e.to_string()
        });

        let metrics_text = match read_metrics_text(&config.artifacts.metrics) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %config.artifacts.metrics.display(), error = %e, "Metrics unavailable");
                None
            }
        };

        Self::from_parts(config, predictor, metrics_text)
    }

    /// Build state from an already loaded predictor
    pub fn with_predictor(
        config: ServerConfig,
        predictor: Option<Predictor>,
        metrics_text: Option<String>,
    ) -> Self {
        let predictor = predictor.ok_or_else(|| {
            WindError::ModelNotLoadedError(config.artifacts.model.display().to_string()).to_string()
        });
        Self::from_parts(config, predictor, metrics_text)
    }

    fn from_parts(
        config: ServerConfig,
        predictor: std::result::Result<Predictor, String>,
        metrics_text: Option<String>,
    ) -> Self {
        info!(
            model_loaded = predictor.is_ok(),
            metrics_loaded = metrics_text.is_some(),
            "Application state ready"
        );
        Self {
            config,
            predictor,
            metrics_text,
            started_at: chrono::Utc::now(),
        }
    }

    /// The loaded predictor, or the reason it could not be loaded
    pub fn predictor(&self) -> Result<&Predictor, ServerError> {
        self.predictor
            .as_ref()
            .map_err(|reason| ServerError::ModelNotLoaded(reason.clone()))
    }

    pub fn model_loaded(&self) -> bool {
        self.predictor.is_ok()
    }

    /// Why the model is unavailable, if it is
    pub fn model_error(&self) -> Option<&str> {
        self.predictor.as_ref().err().map(String::as_str)
    }

    /// Metrics report text, or a placeholder
    pub fn metrics_text(&self) -> &str {
        self.metrics_text.as_deref().unwrap_or(METRICS_UNAVAILABLE)
    }

    pub fn metrics_available(&self) -> bool {
        self.metrics_text.is_some()
    }
}
