//! Batch training job

use super::config::ModelConfig;
use super::regressor::{derive_params, Hyperparameters, Regressor, MODEL_FILE_NAME};
use crate::error::{PricerError, Result};
use crate::preprocessing::{Pipeline, PipelineParams, PREPROCESSOR_FILE_NAME};
use crate::schema::DataSchema;
use crate::utils::DataLoader;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// What a training run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub n_rows: usize,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub hyperparameters: Hyperparameters,
    pub oob_score: Option<f64>,
    pub training_time_secs: f64,
}

/// Fitted pipeline and model from one training run
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub pipeline: Pipeline,
    pub model: Regressor,
    pub summary: TrainingSummary,
}

impl TrainedArtifacts {
    /// Write `preprocessor.json` and `model.json` into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        self.pipeline.save(dir.join(PREPROCESSOR_FILE_NAME))?;
        self.model.save(dir.join(MODEL_FILE_NAME))?;
        info!(dir = %dir.display(), "Saved artifacts");
        Ok(())
    }
}

/// Load both artifacts from `dir`
pub fn load_artifacts(dir: &Path) -> Result<(Pipeline, Regressor)> {
    let pipeline = Pipeline::load(dir.join(PREPROCESSOR_FILE_NAME))?;
    let model = Regressor::load(dir.join(MODEL_FILE_NAME))?;
    Ok((pipeline, model))
}

/// Target column as f64; a null or non-numeric target is an error
pub fn target_values(df: &DataFrame, target: &str) -> Result<Array1<f64>> {
    let column = df
        .column(target)
        .map_err(|_| PricerError::FeatureNotFound(target.to_string()))?;
    let casted = column.cast(&DataType::Float64)?;
    let values = casted.f64()?;
    if values.null_count() > 0 {
        return Err(PricerError::DataError(format!(
            "target '{}' has {} missing or non-numeric values",
            target,
            values.null_count()
        )));
    }
    Ok(values.into_no_null_iter().collect())
}

/// Fit the pipeline and the model on an in-memory frame
pub fn train(df: &DataFrame, schema: &DataSchema, config: &ModelConfig) -> Result<TrainedArtifacts> {
    let start = Instant::now();
    config.validate()?;

    let y = target_values(df, schema.target_field())?;

    info!(rows = df.height(), cols = df.width(), "Pre-processing data");
    let params = PipelineParams::from_training_data(df, schema, config)?;
    let mut pipeline = Pipeline::new(params);
    let x = pipeline.fit_transform(df)?;
    info!(shape = ?x.shape(), "Processed training matrix");

    let derived = derive_params(x.shape());
    let hyperparameters = Hyperparameters::resolve(derived, &config.hyperparameters);

    info!(
        n_estimators = hyperparameters.n_estimators,
        max_features = hyperparameters.max_features,
        max_samples = hyperparameters.max_samples,
        "Training model"
    );
    let mut model = Regressor::new(hyperparameters.clone());
    model.fit(&x, &y)?;

    let summary = TrainingSummary {
        n_rows: x.n_rows(),
        n_features: x.n_cols(),
        feature_names: x.names().to_vec(),
        hyperparameters,
        oob_score: model.oob_score(),
        training_time_secs: start.elapsed().as_secs_f64(),
    };

    Ok(TrainedArtifacts {
        pipeline,
        model,
        summary,
    })
}

/// Read training data from disk, train, and persist both artifacts
pub fn run_training(
    data_path: &Path,
    schema: &DataSchema,
    config: &ModelConfig,
    artifacts_dir: &Path,
) -> Result<TrainingSummary> {
    let df = DataLoader::new().load(data_path)?;
    let artifacts = train(&df, schema, config)?;
    artifacts.save(artifacts_dir)?;

    info!(
        rows = artifacts.summary.n_rows,
        features = artifacts.summary.n_features,
        secs = artifacts.summary.training_time_secs,
        "Done training and saving model"
    );
    Ok(artifacts.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "Id" => &["1", "2", "3", "4", "5", "6"],
            "Carat Weight" => &[0.8, 1.0, 1.2, 1.5, 2.0, 2.5],
            "Cut" => &["Ideal", "Good", "Ideal", "Very Good", "Ideal", "Good"],
            "Price" => &[3000.0, 4200.0, 5100.0, 8000.0, 12500.0, 16000.0]
        )
        .unwrap()
    }

    #[test]
    fn test_train_derives_max_features() {
        let schema = DataSchema::new("Price", &["Cut"], &["Carat Weight"]);
        let config = ModelConfig::new().with_n_estimators(5);
        let artifacts = train(&frame(), &schema, &config).unwrap();

        // Carat Weight plus three Cut indicators
        assert_eq!(artifacts.summary.n_features, 4);
        assert_eq!(artifacts.summary.hyperparameters.max_features, 2);
        assert_eq!(artifacts.model.feature_names(), artifacts.pipeline.feature_names());
    }

    #[test]
    fn test_null_target_rejected() {
        let df = df!(
            "Carat Weight" => &[1.0, 2.0],
            "Price" => &[Some(1.0), None]
        )
        .unwrap();
        let schema = DataSchema::new("Price", &[], &["Carat Weight"]);
        assert!(matches!(
            train(&df, &schema, &ModelConfig::default()),
            Err(PricerError::DataError(_))
        ));
    }

    #[test]
    fn test_missing_target_column() {
        let df = df!("Carat Weight" => &[1.0]).unwrap();
        let schema = DataSchema::new("Price", &[], &["Carat Weight"]);
        assert!(matches!(
            train(&df, &schema, &ModelConfig::default()),
            Err(PricerError::FeatureNotFound(_))
        ));
    }
}
