//! Model configuration

use crate::error::{PricerError, Result};
use crate::schema::resolve_json_file;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional overrides for the forest hyperparameters.
///
/// Anything left as `None` falls back to the defaults, or for
/// `max_features` to the value derived from the feature matrix shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperparameterOverrides {
    pub n_estimators: Option<usize>,
    pub max_features: Option<usize>,
    pub max_samples: Option<f64>,
    pub bootstrap: Option<bool>,
    pub random_state: Option<u64>,
    pub oob_score: Option<bool>,
}

/// Configuration for preprocessing thresholds and model hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Minimum category share that escapes the rare bucket
    #[serde(alias = "rare_perc_threshold")]
    pub rare_category_threshold: f64,

    /// Null share at or above which a categorical is imputed with the missing tag
    pub missing_tag_threshold: f64,

    /// Top-K bound for one-hot encoding
    pub max_one_hot_categories: usize,

    /// Scaled numeric values are clipped into `[-clip_bound, clip_bound]`
    pub clip_bound: f64,

    pub hyperparameters: HyperparameterOverrides,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            rare_category_threshold: 0.01,
            missing_tag_threshold: 0.1,
            max_one_hot_categories: 10,
            clip_bound: 4.0,
            hyperparameters: HyperparameterOverrides::default(),
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file, or from the only `.json` file in a directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_json_file(path.as_ref())?;
        let json = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_rare_threshold(mut self, threshold: f64) -> Self {
        self.rare_category_threshold = threshold;
        self
    }

    pub fn with_missing_tag_threshold(mut self, threshold: f64) -> Self {
        self.missing_tag_threshold = threshold;
        self
    }

    pub fn with_max_one_hot(mut self, max_categories: usize) -> Self {
        self.max_one_hot_categories = max_categories;
        self
    }

    pub fn with_clip_bound(mut self, bound: f64) -> Self {
        self.clip_bound = bound;
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.hyperparameters.n_estimators = Some(n_estimators);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.hyperparameters.max_features = Some(max_features);
        self
    }

    pub fn with_max_samples(mut self, max_samples: f64) -> Self {
        self.hyperparameters.max_samples = Some(max_samples);
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.hyperparameters.bootstrap = Some(bootstrap);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.hyperparameters.random_state = Some(seed);
        self
    }

    pub fn with_oob_score(mut self, oob_score: bool) -> Self {
        self.hyperparameters.oob_score = Some(oob_score);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rare_category_threshold) {
            return Err(PricerError::ConfigError(format!(
                "rare_category_threshold must be in [0, 1], got {}",
                self.rare_category_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.missing_tag_threshold) {
            return Err(PricerError::ConfigError(format!(
                "missing_tag_threshold must be in [0, 1], got {}",
                self.missing_tag_threshold
            )));
        }
        if self.max_one_hot_categories == 0 {
            return Err(PricerError::ConfigError(
                "max_one_hot_categories must be at least 1".to_string(),
            ));
        }
        if !(self.clip_bound > 0.0) {
            return Err(PricerError::ConfigError(format!(
                "clip_bound must be positive, got {}",
                self.clip_bound
            )));
        }

        let hp = &self.hyperparameters;
        if hp.n_estimators == Some(0) {
            return Err(PricerError::ConfigError("n_estimators must be at least 1".to_string()));
        }
        if hp.max_features == Some(0) {
            return Err(PricerError::ConfigError("max_features must be at least 1".to_string()));
        }
        if let Some(fraction) = hp.max_samples {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(PricerError::ConfigError(format!(
                    "max_samples must be in (0, 1], got {}",
                    fraction
                )));
            }
        }
        Ok(())
    }
}
