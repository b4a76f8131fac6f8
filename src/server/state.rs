//! Application state management

use crate::error::Result;
use crate::preprocessing::Pipeline;
use crate::training::{load_artifacts, Regressor};
use crate::validation::DiamondRecord;
use std::path::Path;

/// Fitted artifacts shared read-only by every request
#[derive(Debug)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub model: Regressor,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, model: Regressor) -> Self {
        Self {
            pipeline,
            model,
            started_at: chrono::Utc::now(),
        }
    }

    /// Load `preprocessor.json` and `model.json` from an artifacts directory
    pub fn load(artifacts_dir: &Path) -> Result<Self> {
        let (pipeline, model) = load_artifacts(artifacts_dir)?;
        Ok(Self::new(pipeline, model))
    }

    /// Price a single validated record
    pub fn predict_one(&self, record: &DiamondRecord) -> Result<f64> {
        let frame = record.to_dataframe()?;
        let features = self.pipeline.transform(&frame)?;
        let predictions = self.model.predict(&features)?;
        predictions.first().copied().ok_or_else(|| {
            crate::error::PricerError::ShapeMismatch {
                expected: "1 prediction".to_string(),
                actual: "0 predictions".to_string(),
            }
        })
    }
}
