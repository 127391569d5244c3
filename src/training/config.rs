//! Training configuration

use crate::error::{Result, WindError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gradient boosting hyperparameters
///
/// Defaults reproduce the reference wind speed model:
/// 200 rounds, learning rate 0.1, depth 6, 80% row and column sampling, seed 42.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Row sampling fraction per round
    pub subsample: f64,
    /// Column sampling fraction per tree
    #[serde(alias = "colsample")]
    pub colsample_bytree: f64,
    /// Seed for row/column sampling; `None` draws from OS entropy
    pub random_state: Option<u64>,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 6,
            subsample: 0.8,
            colsample_bytree: 0.8,
            random_state: Some(42),
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
        }
    }
}

impl Hyperparameters {
    /// Reject values the booster cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(WindError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "must be at least 1",
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(WindError::invalid_parameter(
                "learning_rate",
                self.learning_rate,
                "must be a positive number",
            ));
        }
        if self.max_depth == 0 {
            return Err(WindError::invalid_parameter(
                "max_depth",
                self.max_depth,
                "must be at least 1",
            ));
        }
        for (name, value) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(WindError::invalid_parameter(name, value, "must be in (0, 1]"));
            }
        }
        for (name, value) in [
            ("min_child_weight", self.min_child_weight),
            ("reg_lambda", self.reg_lambda),
            ("reg_alpha", self.reg_alpha),
            ("gamma", self.gamma),
        ] {
            if !(value >= 0.0) {
                return Err(WindError::invalid_parameter(name, value, "must be non-negative"));
            }
        }
        Ok(())
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub hyperparameters: Hyperparameters,
    /// Trailing fraction of the time-ordered records held out for evaluation
    pub holdout_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            holdout_fraction: 0.2,
        }
    }
}

impl TrainingConfig {
    /// Create a configuration with the given hyperparameters
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            hyperparameters,
            ..Default::default()
        }
    }

    /// Builder method to set number of boosting rounds
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.hyperparameters.n_estimators = n;
        self
    }

    /// Builder method to set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.hyperparameters.learning_rate = lr;
        self
    }

    /// Builder method to set max depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.hyperparameters.max_depth = depth;
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.hyperparameters.random_state = Some(seed);
        self
    }

    /// Builder method to set the holdout fraction
    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(WindError::invalid_parameter(
                "holdout_fraction",
                self.holdout_fraction,
                "must be in (0, 1)",
            ));
        }
        self.hyperparameters.validate()
    }

    /// Load a configuration from a JSON file; omitted keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.holdout_fraction, 0.2);
        assert_eq!(config.hyperparameters.n_estimators, 200);
        assert_eq!(config.hyperparameters.random_state, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TrainingConfig::default()
            .with_n_estimators(10)
            .with_learning_rate(0.3)
            .with_max_depth(3)
            .with_random_state(7)
            .with_holdout_fraction(0.25);
        assert_eq!(config.hyperparameters.n_estimators, 10);
        assert_eq!(config.hyperparameters.max_depth, 3);
        assert_eq!(config.hyperparameters.random_state, Some(7));
        assert_eq!(config.holdout_fraction, 0.25);
    }

    #[test]
    fn test_invalid_values() {
        assert!(TrainingConfig::default().with_n_estimators(0).validate().is_err());
        assert!(TrainingConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(TrainingConfig::default().with_holdout_fraction(1.0).validate().is_err());
        assert!(TrainingConfig::default().with_holdout_fraction(0.0).validate().is_err());

        let mut config = TrainingConfig::default();
        config.hyperparameters.subsample = 1.5;
        assert!(matches!(
            config.validate(),
            Err(WindError::InvalidParameter { ref name, .. }) if name == "subsample"
        ));
    }

    #[test]
    fn test_partial_json_and_colsample_alias() {
        let json = r#"{"hyperparameters": {"n_estimators": 50, "colsample": 0.5}}"#;
        let config: TrainingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.hyperparameters.n_estimators, 50);
        assert_eq!(config.hyperparameters.colsample_bytree, 0.5);
        assert_eq!(config.hyperparameters.learning_rate, 0.1);
        assert_eq!(config.holdout_fraction, 0.2);
    }
}
