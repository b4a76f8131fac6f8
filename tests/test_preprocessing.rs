//! Integration tests for the feature pipeline: column routing, fit/transform
//! parity, partial input, unseen categories and persistence

use diamond_pricer::preprocessing::{FeatureMatrix, Pipeline, PipelineParams};
use diamond_pricer::schema::DataSchema;
use diamond_pricer::training::ModelConfig;
use diamond_pricer::validation::DiamondRecord;
use polars::prelude::*;
use serde_json::json;

const CUTS: [&str; 5] = ["Ideal", "Very Good", "Good", "Ideal", "Signature-Ideal"];
const COLORS: [&str; 4] = ["E", "F", "G", "H"];
const POLISH: [&str; 3] = ["EX", "VG", "EX"];

/// 20 rows; Color is null in every fifth row, Polish once
fn training_frame() -> DataFrame {
    let n = 20;
    let carat: Vec<f64> = (0..n).map(|i| 0.8 + 0.1 * i as f64).collect();
    let cut: Vec<&str> = (0..n).map(|i| CUTS[i % CUTS.len()]).collect();
    let color: Vec<Option<&str>> = (0..n)
        .map(|i| if i % 5 == 0 { None } else { Some(COLORS[i % COLORS.len()]) })
        .collect();
    let polish: Vec<Option<&str>> = (0..n)
        .map(|i| if i == 7 { None } else { Some(POLISH[i % POLISH.len()]) })
        .collect();
    let price: Vec<f64> = carat.iter().map(|c| 4000.0 * c + 500.0).collect();
    let id: Vec<String> = (0..n).map(|i| format!("d-{i}")).collect();

    df!(
        "Id" => id,
        "Carat Weight" => carat,
        "Cut" => cut,
        "Color" => color,
        "Polish" => polish,
        "Price" => price
    )
    .unwrap()
}

fn schema() -> DataSchema {
    DataSchema::new("Price", &["Cut", "Color", "Polish"], &["Carat Weight"])
}

fn fitted_pipeline() -> (Pipeline, FeatureMatrix) {
    let df = training_frame();
    let params = PipelineParams::from_training_data(&df, &schema(), &ModelConfig::default()).unwrap();
    let mut pipeline = Pipeline::new(params);
    let x = pipeline.fit_transform(&df).unwrap();
    (pipeline, x)
}

fn column_index(pipeline: &Pipeline, name: &str) -> usize {
    pipeline
        .feature_names()
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("feature '{name}' not in {:?}", pipeline.feature_names()))
}

// ============================================================================
// Column routing
// ============================================================================

#[test]
fn test_null_share_routes_categoricals() {
    let params =
        PipelineParams::from_training_data(&training_frame(), &schema(), &ModelConfig::default())
            .unwrap();
    assert_eq!(params.cat_vars_missing_tag, vec!["Color".to_string()]);
    assert_eq!(params.cat_vars_frequent, vec!["Cut".to_string(), "Polish".to_string()]);
    assert!(params.num_vars_na.is_empty());
}

#[test]
fn test_numeric_nulls_add_indicator() {
    let mut df = training_frame();
    let carat: Vec<Option<f64>> = (0..20)
        .map(|i| if i == 3 { None } else { Some(0.8 + 0.1 * i as f64) })
        .collect();
    df.with_column(Column::new("Carat Weight".into(), carat)).unwrap();

    let params = PipelineParams::from_training_data(&df, &schema(), &ModelConfig::default()).unwrap();
    assert_eq!(params.num_vars_na, vec!["Carat Weight".to_string()]);

    let mut pipeline = Pipeline::new(params);
    let x = pipeline.fit_transform(&df).unwrap();
    let na = column_index(&pipeline, "Carat Weight_na");
    assert_eq!(x.values()[[3, na]], 1.0);
    assert_eq!(x.values()[[4, na]], 0.0);
    assert!(x.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_missing_schema_column_is_reported() {
    let df = training_frame().drop("Polish").unwrap();
    let result = PipelineParams::from_training_data(&df, &schema(), &ModelConfig::default());
    assert!(result.is_err());
}

// ============================================================================
// Transform behaviour
// ============================================================================

#[test]
fn test_fit_transform_parity() {
    let (pipeline, train_x) = fitted_pipeline();
    let again = pipeline.transform(&training_frame()).unwrap();
    assert_eq!(again.values(), train_x.values());
    assert_eq!(again.names(), train_x.names());
}

#[test]
fn test_transform_is_deterministic() {
    let (pipeline, _) = fitted_pipeline();
    let df = training_frame();
    let first = pipeline.transform(&df).unwrap();
    let second = pipeline.transform(&df).unwrap();
    assert_eq!(first.values(), second.values());
    assert_eq!(first.names(), second.names());
}

#[test]
fn test_id_and_target_are_not_features() {
    let (pipeline, _) = fitted_pipeline();
    let names = pipeline.feature_names();
    assert!(!names.iter().any(|n| n == "Id" || n == "Price"));
    assert!(names.iter().any(|n| n == "Carat Weight"));
    assert!(names.iter().any(|n| n == "Color_missing"));
}

#[test]
fn test_single_record_with_absent_categoricals_keeps_width() {
    let (pipeline, _) = fitted_pipeline();
    let record = DiamondRecord::from_json(&json!({ "Id": "p-1", "Carat Weight": 1.3 })).unwrap();
    let x = pipeline.transform(&record.to_dataframe().unwrap()).unwrap();

    assert_eq!(x.shape(), (1, pipeline.feature_names().len()));
    // Color nulls map to the "missing" category seen during fit
    assert_eq!(x.values()[[0, column_index(&pipeline, "Color_missing")]], 1.0);
    // Polish nulls fall back to its most frequent value
    assert_eq!(x.values()[[0, column_index(&pipeline, "Polish_EX")]], 1.0);
}

#[test]
fn test_unseen_category_encodes_to_zeros() {
    let (pipeline, _) = fitted_pipeline();
    let df = df!(
        "Carat Weight" => &[1.0],
        "Cut" => &["Ideal"],
        "Color" => &["Purple"],
        "Polish" => &["EX"]
    )
    .unwrap();
    let x = pipeline.transform(&df).unwrap();

    for (i, name) in pipeline.feature_names().iter().enumerate() {
        if name.starts_with("Color_") {
            assert_eq!(x.values()[[0, i]], 0.0, "{name}");
        }
    }
}

#[test]
fn test_extreme_values_are_clipped() {
    let (pipeline, _) = fitted_pipeline();
    let df = df!(
        "Carat Weight" => &[1000.0, -1000.0],
        "Cut" => &["Ideal", "Good"],
        "Color" => &["E", "F"],
        "Polish" => &["EX", "VG"]
    )
    .unwrap();
    let x = pipeline.transform(&df).unwrap();
    let carat = column_index(&pipeline, "Carat Weight");
    assert_eq!(x.values()[[0, carat]], 4.0);
    assert_eq!(x.values()[[1, carat]], -4.0);
}

#[test]
fn test_column_order_of_input_does_not_matter() {
    let (pipeline, _) = fitted_pipeline();
    let df = training_frame();
    let reordered = df
        .select(["Polish", "Price", "Color", "Carat Weight", "Id", "Cut"])
        .unwrap();
    assert_eq!(
        pipeline.transform(&df).unwrap().values(),
        pipeline.transform(&reordered).unwrap().values()
    );
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_saved_pipeline_transforms_identically() {
    let (pipeline, _) = fitted_pipeline();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessor.json");
    pipeline.save(&path).unwrap();

    let restored = Pipeline::load(&path).unwrap();
    assert_eq!(restored.feature_names(), pipeline.feature_names());
    assert_eq!(restored.step_names(), pipeline.step_names());

    let df = training_frame();
    assert_eq!(
        restored.transform(&df).unwrap().values(),
        pipeline.transform(&df).unwrap().values()
    );
}

#[test]
fn test_load_missing_file_is_artifact_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Pipeline::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(
        err,
        diamond_pricer::error::PricerError::ArtifactError { .. }
    ));
}
