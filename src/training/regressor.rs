//! Price regressor: hyperparameters, fitting and persistence

use super::config::HyperparameterOverrides;
use super::random_forest::{MaxFeatures, RandomForest};
use crate::error::{PricerError, Result};
use crate::preprocessing::FeatureMatrix;
use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Version tag written into every persisted model
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// File name of the persisted model inside an artifacts directory
pub const MODEL_FILE_NAME: &str = "model.json";

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub n_estimators: usize,
    /// Features sampled per split, clamped to the column count at fit
    pub max_features: usize,
    /// Bootstrap sample size as a fraction of the training rows, in (0, 1]
    pub max_samples: f64,
    pub bootstrap: bool,
    pub random_state: u64,
    pub oob_score: bool,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_estimators: 250,
            max_features: 3,
            max_samples: 0.7,
            bootstrap: true,
            random_state: 42,
            oob_score: true,
        }
    }
}

/// Hyperparameters that depend on the shape of the training matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedParams {
    pub max_features: usize,
}

/// `max_features = max(1, round(0.5 * n_cols))`
pub fn derive_params(shape: (usize, usize)) -> DerivedParams {
    let (_, n_cols) = shape;
    DerivedParams {
        max_features: ((0.5 * n_cols as f64).round() as usize).max(1),
    }
}

impl Hyperparameters {
    /// Defaults, then derived values, then explicit overrides
    pub fn resolve(derived: DerivedParams, overrides: &HyperparameterOverrides) -> Self {
        let defaults = Self::default();
        Self {
            n_estimators: overrides.n_estimators.unwrap_or(defaults.n_estimators),
            max_features: overrides.max_features.unwrap_or(derived.max_features),
            max_samples: overrides.max_samples.unwrap_or(defaults.max_samples),
            bootstrap: overrides.bootstrap.unwrap_or(defaults.bootstrap),
            random_state: overrides.random_state.unwrap_or(defaults.random_state),
            oob_score: overrides.oob_score.unwrap_or(defaults.oob_score),
        }
    }
}

/// Random forest price model bound to the feature layout it was fitted on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regressor {
    format_version: u32,
    hyperparameters: Hyperparameters,
    feature_names: Vec<String>,
    forest: RandomForest,
    trained_at: Option<DateTime<Utc>>,
}

impl Regressor {
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        let forest = Self::build_forest(&hyperparameters);
        Self {
            format_version: MODEL_FORMAT_VERSION,
            hyperparameters,
            feature_names: Vec::new(),
            forest,
            trained_at: None,
        }
    }

    fn build_forest(hp: &Hyperparameters) -> RandomForest {
        RandomForest::new(hp.n_estimators)
            .with_max_features(MaxFeatures::Fixed(hp.max_features))
            .with_max_samples(hp.max_samples)
            .with_bootstrap(hp.bootstrap)
            .with_random_state(hp.random_state)
            .with_oob_score(hp.oob_score)
    }

    /// Fit on a feature matrix, replacing anything learned before
    pub fn fit(&mut self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<()> {
        if x.n_rows() == 0 {
            return Err(PricerError::TrainingError("training data is empty".to_string()));
        }
        if x.n_rows() != y.len() {
            return Err(PricerError::ShapeMismatch {
                expected: format!("{} targets", x.n_rows()),
                actual: format!("{} targets", y.len()),
            });
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(PricerError::TrainingError(format!(
                "target value at row {} is not finite",
                i
            )));
        }

        let start = Instant::now();
        let mut forest = Self::build_forest(&self.hyperparameters);
        forest.fit(x.values(), y)?;

        self.forest = forest;
        self.feature_names = x.names().to_vec();
        self.trained_at = Some(Utc::now());

        info!(
            rows = x.n_rows(),
            features = x.n_cols(),
            trees = self.forest.n_trees(),
            max_features = self.hyperparameters.max_features.min(x.n_cols()),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model fitted"
        );
        if let Some(oob) = self.forest.oob_score_value() {
            info!(oob_r2 = oob, "Out-of-bag score");
        }
        Ok(())
    }

    /// One prediction per row
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>> {
        if self.feature_names.is_empty() {
            return Err(PricerError::ModelNotFitted);
        }
        if x.names() != self.feature_names.as_slice() {
            return Err(PricerError::ShapeMismatch {
                expected: format!("{} features {:?}", self.feature_names.len(), self.feature_names),
                actual: format!("{} features {:?}", x.n_cols(), x.names()),
            });
        }
        self.forest.predict(x.values())
    }

    /// Coefficient of determination, `1 - SS_res / SS_tot`
    pub fn evaluate(&self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(PricerError::ShapeMismatch {
                expected: format!("{} targets", predictions.len()),
                actual: format!("{} targets", y.len()),
            });
        }

        let mean = y.mean().unwrap_or(0.0);
        let ss_tot: f64 = y.iter().map(|t| (t - mean).powi(2)).sum();
        let ss_res: f64 = y.iter().zip(predictions.iter()).map(|(t, p)| (t - p).powi(2)).sum();
        if ss_tot == 0.0 {
            return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - ss_res / ss_tot)
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn is_fitted(&self) -> bool {
        !self.feature_names.is_empty()
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }

    pub fn oob_score(&self) -> Option<f64> {
        self.forest.oob_score_value()
    }

    /// Importance of each feature, paired with its name
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        match self.forest.feature_importances() {
            Some(imp) => self.feature_names.iter().cloned().zip(imp.iter().copied()).collect(),
            None => Vec::new(),
        }
    }

    /// Save the model as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_fitted() {
            return Err(PricerError::ModelNotFitted);
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), "Saved model");
        Ok(())
    }

    /// Load a model saved by [`Regressor::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let artifact_error = |reason: String| PricerError::ArtifactError {
            path: path.display().to_string(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| artifact_error(e.to_string()))?;
        let version = value.get("format_version").and_then(|v| v.as_u64());
        if version != Some(u64::from(MODEL_FORMAT_VERSION)) {
            return Err(artifact_error(format!(
                "unsupported model format version {:?}, expected {}",
                version, MODEL_FORMAT_VERSION
            )));
        }

        let model: Self = serde_json::from_value(value).map_err(|e| artifact_error(e.to_string()))?;
        if !model.is_fitted() {
            return Err(artifact_error("model was saved before fitting".to_string()));
        }
        Ok(model)
    }
}
