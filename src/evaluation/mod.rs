//! Held-out evaluation
//!
//! Applies a fitted pipeline and model to labelled data, scores the
//! predictions and writes `results.json` plus `predictions.csv`.

mod metrics;

pub use metrics::{iqr, mae, percentile, rmse, round4, squared_correlation, ScoreReport};

use crate::error::Result;
use crate::preprocessing::Pipeline;
use crate::schema::DataSchema;
use crate::training::{load_artifacts, target_values, Regressor};
use crate::utils::{save_csv, DataLoader};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

pub const RESULTS_FILE_NAME: &str = "results.json";
pub const PREDICTIONS_FILE_NAME: &str = "predictions.csv";

/// Name of the prediction column appended to the evaluated rows
pub const PREDICTIONS_COLUMN: &str = "predictions";

/// Predictions and scores for one held-out set
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub scores: ScoreReport,
    pub predictions: Vec<f64>,
}

/// Predict every row of `df` and score against the schema's target
pub fn evaluate(
    df: &DataFrame,
    schema: &DataSchema,
    pipeline: &Pipeline,
    model: &Regressor,
) -> Result<Evaluation> {
    let y = target_values(df, schema.target_field())?.to_vec();
    let x = pipeline.transform(df)?;
    let predictions = model.predict(&x)?.to_vec();

    let scores = ScoreReport::compute(&y, &predictions)?;
    info!(
        rmse = scores.rmse,
        mae = scores.mae,
        nmae = scores.nmae,
        r2 = scores.r2,
        "Evaluation scores"
    );

    Ok(Evaluation {
        scores,
        predictions,
    })
}

/// Input rows with the predictions appended as a `predictions` column
pub fn with_predictions(df: &DataFrame, predictions: &[f64]) -> Result<DataFrame> {
    let mut out = df.clone();
    out.with_column(Column::new(PREDICTIONS_COLUMN.into(), predictions))?;
    Ok(out)
}

/// Load test data and artifacts from disk, evaluate, and write the result files
pub fn run_evaluation(
    data_path: &Path,
    schema: &DataSchema,
    artifacts_dir: &Path,
    results_dir: &Path,
) -> Result<ScoreReport> {
    let df = DataLoader::new().load(data_path)?;
    let (pipeline, model) = load_artifacts(artifacts_dir)?;

    let evaluation = evaluate(&df, schema, &pipeline, &model)?;

    std::fs::create_dir_all(results_dir)?;
    let json = serde_json::to_string_pretty(&evaluation.scores)?;
    std::fs::write(results_dir.join(RESULTS_FILE_NAME), json)?;

    let mut output = with_predictions(&df, &evaluation.predictions)?;
    save_csv(&mut output, &results_dir.join(PREDICTIONS_FILE_NAME))?;

    info!(dir = %results_dir.display(), rows = df.height(), "Wrote evaluation results");
    Ok(evaluation.scores)
}
