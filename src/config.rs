//! Artifact locations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "model/wind_speed_model.bin";
pub const DEFAULT_METRICS_PATH: &str = "model/metrics.txt";

/// Where the model and its metrics report live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub metrics: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: std::env::var("WINDSPEED_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            metrics: std::env::var("WINDSPEED_METRICS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_METRICS_PATH)),
        }
    }
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, metrics: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            metrics: metrics.into(),
        }
    }

    /// Both artifacts under one directory, with their default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            model: dir.join("wind_speed_model.bin"),
            metrics: dir.join("metrics.txt"),
        }
    }

    /// Apply CLI overrides
    pub fn with_overrides(mut self, model: Option<PathBuf>, metrics: Option<PathBuf>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(metrics) = metrics {
            self.metrics = metrics;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir() {
        let paths = ArtifactPaths::in_dir("/tmp/run");
        assert_eq!(paths.model, PathBuf::from("/tmp/run/wind_speed_model.bin"));
        assert_eq!(paths.metrics, PathBuf::from("/tmp/run/metrics.txt"));
    }

    #[test]
    fn test_overrides() {
        let paths = ArtifactPaths::new("a.bin", "a.txt")
            .with_overrides(Some(PathBuf::from("b.bin")), None);
        assert_eq!(paths.model, PathBuf::from("b.bin"));
        assert_eq!(paths.metrics, PathBuf::from("a.txt"));
    }
}
