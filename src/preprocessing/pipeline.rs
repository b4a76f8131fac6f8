//! Ordered, persistable preprocessing pipeline

use super::{
    BoundedOneHotEncoder, CastType, CategoricalImputer, ColumnSelector, ColumnTransformer,
    FeatureMatrix, MeanImputer, MissingIndicator, PipelineParams, RareLabelGrouper,
    StandardScaler, TypeCaster, ValueClipper,
};
use crate::error::{PricerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Version tag written into every persisted pipeline
pub const PIPELINE_FORMAT_VERSION: u32 = 1;

/// File name of the persisted pipeline inside an artifacts directory
pub const PREPROCESSOR_FILE_NAME: &str = "preprocessor.json";

/// One concrete transformer, tagged by kind when persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    Selector(ColumnSelector),
    Caster(TypeCaster),
    CategoricalImputer(CategoricalImputer),
    RareLabelGrouper(RareLabelGrouper),
    OneHotEncoder(BoundedOneHotEncoder),
    MissingIndicator(MissingIndicator),
    MeanImputer(MeanImputer),
    StandardScaler(StandardScaler),
    ValueClipper(ValueClipper),
}

impl PipelineStep {
    fn as_transformer(&self) -> &dyn ColumnTransformer {
        match self {
            PipelineStep::Selector(t) => t,
            PipelineStep::Caster(t) => t,
            PipelineStep::CategoricalImputer(t) => t,
            PipelineStep::RareLabelGrouper(t) => t,
            PipelineStep::OneHotEncoder(t) => t,
            PipelineStep::MissingIndicator(t) => t,
            PipelineStep::MeanImputer(t) => t,
            PipelineStep::StandardScaler(t) => t,
            PipelineStep::ValueClipper(t) => t,
        }
    }

    fn as_transformer_mut(&mut self) -> &mut dyn ColumnTransformer {
        match self {
            PipelineStep::Selector(t) => t,
            PipelineStep::Caster(t) => t,
            PipelineStep::CategoricalImputer(t) => t,
            PipelineStep::RareLabelGrouper(t) => t,
            PipelineStep::OneHotEncoder(t) => t,
            PipelineStep::MissingIndicator(t) => t,
            PipelineStep::MeanImputer(t) => t,
            PipelineStep::StandardScaler(t) => t,
            PipelineStep::ValueClipper(t) => t,
        }
    }
}

impl ColumnTransformer for PipelineStep {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.as_transformer_mut().fit(df)
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.as_transformer().transform(df)
    }
}

/// A pipeline step with its stable name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedStep {
    pub name: String,
    pub transformer: PipelineStep,
}

impl NamedStep {
    fn new(name: &str, transformer: PipelineStep) -> Self {
        Self {
            name: name.to_string(),
            transformer,
        }
    }
}

/// Raw records in, fixed-width feature matrix out.
///
/// The step sequence is fixed when the pipeline is built. After
/// [`Pipeline::fit_transform`] the output column names are recorded and every
/// later [`Pipeline::transform`] returns exactly those columns in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    format_version: u32,
    params: PipelineParams,
    steps: Vec<NamedStep>,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl Pipeline {
    /// Assemble the step sequence for the given parameters
    pub fn new(params: PipelineParams) -> Self {
        let cat = params.categorical_vars.clone();
        let num = params.numerical_vars.clone();
        let mut steps = vec![NamedStep::new(
            "column_selector",
            PipelineStep::Selector(ColumnSelector::keep(params.predictors())),
        )];

        if !cat.is_empty() {
            steps.push(NamedStep::new(
                "string_type_caster",
                PipelineStep::Caster(TypeCaster::new(cat.clone(), CastType::String)),
            ));
        }
        if !params.cat_vars_missing_tag.is_empty() {
            steps.push(NamedStep::new(
                "cat_imputer_missing_tag",
                PipelineStep::CategoricalImputer(CategoricalImputer::missing_tag(
                    params.cat_vars_missing_tag.clone(),
                )),
            ));
        }
        if !params.cat_vars_frequent.is_empty() {
            steps.push(NamedStep::new(
                "cat_imputer_most_frequent",
                PipelineStep::CategoricalImputer(CategoricalImputer::most_frequent(
                    params.cat_vars_frequent.clone(),
                )),
            ));
        }
        if !cat.is_empty() {
            steps.push(NamedStep::new(
                "cat_rare_label_grouper",
                PipelineStep::RareLabelGrouper(RareLabelGrouper::new(
                    cat.clone(),
                    params.rare_category_threshold,
                )),
            ));
            steps.push(NamedStep::new(
                "cat_one_hot_encoder",
                PipelineStep::OneHotEncoder(BoundedOneHotEncoder::new(
                    cat.clone(),
                    params.max_one_hot_categories,
                )),
            ));
            steps.push(NamedStep::new(
                "feature_dropper",
                PipelineStep::Selector(ColumnSelector::drop(cat)),
            ));
        }
        if !num.is_empty() {
            steps.push(NamedStep::new(
                "float_type_caster",
                PipelineStep::Caster(TypeCaster::new(num.clone(), CastType::Float)),
            ));
        }
        if !params.num_vars_na.is_empty() {
            steps.push(NamedStep::new(
                "numerical_missing_indicator",
                PipelineStep::MissingIndicator(MissingIndicator::new(params.num_vars_na.clone())),
            ));
            steps.push(NamedStep::new(
                "numerical_mean_imputer",
                PipelineStep::MeanImputer(MeanImputer::new(params.num_vars_na.clone())),
            ));
        }
        if !num.is_empty() {
            steps.push(NamedStep::new(
                "numerical_standard_scaler",
                PipelineStep::StandardScaler(StandardScaler::new(num.clone())),
            ));
            steps.push(NamedStep::new(
                "value_clipper",
                PipelineStep::ValueClipper(ValueClipper::symmetric(num, params.clip_bound)),
            ));
        }

        Self {
            format_version: PIPELINE_FORMAT_VERSION,
            params,
            steps,
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit every step in sequence and return the training feature matrix
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<FeatureMatrix> {
        let start = Instant::now();
        if df.height() == 0 {
            return Err(PricerError::DataError("cannot fit pipeline on empty data".to_string()));
        }

        let mut current = df.clone();
        for step in &mut self.steps {
            current = step.transformer.fit_transform(&current).map_err(|e| match e {
                PricerError::DataError(msg) => {
                    PricerError::PreprocessingError(format!("step '{}': {}", step.name, msg))
                }
                other => other,
            })?;
            debug!(step = %step.name, columns = current.width(), "Fitted pipeline step");
        }

        self.feature_names = current
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        self.is_fitted = true;

        info!(
            rows = current.height(),
            features = self.feature_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline fitted"
        );

        FeatureMatrix::from_dataframe(&current, &self.feature_names)
    }

    /// Run the fitted steps and return the transformed frame, columns in fit order
    pub fn transform_frame(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PricerError::ModelNotFitted);
        }

        let mut current = df.clone();
        for step in &self.steps {
            current = step.transformer.transform(&current)?;
        }

        if let Some(missing) = self
            .feature_names
            .iter()
            .find(|name| current.column(name.as_str()).is_err())
        {
            return Err(PricerError::SchemaMismatch(format!(
                "transformed data lacks fitted feature '{}'",
                missing
            )));
        }
        Ok(current.select(self.feature_names.clone())?)
    }

    /// Apply the fitted steps to new data
    pub fn transform(&self, df: &DataFrame) -> Result<FeatureMatrix> {
        let frame = self.transform_frame(df)?;
        FeatureMatrix::from_dataframe(&frame, &self.feature_names)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Output column names recorded at fit
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn steps(&self) -> &[NamedStep] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Save the pipeline as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_fitted {
            return Err(PricerError::ModelNotFitted);
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), "Saved pipeline");
        Ok(())
    }

    /// Load a pipeline saved by [`Pipeline::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let artifact_error = |reason: String| PricerError::ArtifactError {
            path: path.display().to_string(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        let header: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| artifact_error(e.to_string()))?;
        let version = header.get("format_version").and_then(|v| v.as_u64());
        if version != Some(u64::from(PIPELINE_FORMAT_VERSION)) {
            return Err(artifact_error(format!(
                "unsupported pipeline format version {:?}, expected {}",
                version, PIPELINE_FORMAT_VERSION
            )));
        }

        let pipeline: Self =
            serde_json::from_value(header).map_err(|e| artifact_error(e.to_string()))?;
        if !pipeline.is_fitted {
            return Err(artifact_error("pipeline was saved before fitting".to_string()));
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_frame() -> DataFrame {
        df!(
            "Id" => &["1", "2", "3", "4"],
            "Carat Weight" => &[Some(1.0), Some(1.5), None, Some(2.0)],
            "Cut" => &[Some("Ideal"), Some("Good"), Some("Ideal"), None],
            "Price" => &[5000.0, 7000.0, 6500.0, 9000.0]
        )
        .unwrap()
    }

    fn params() -> PipelineParams {
        PipelineParams::new(vec!["Cut".to_string()], vec!["Carat Weight".to_string()])
            .with_frequent_vars(vec!["Cut".to_string()])
            .with_num_na_vars(vec!["Carat Weight".to_string()])
    }

    #[test]
    fn test_step_order() {
        let pipeline = Pipeline::new(params());
        assert_eq!(
            pipeline.step_names(),
            vec![
                "column_selector",
                "string_type_caster",
                "cat_imputer_most_frequent",
                "cat_rare_label_grouper",
                "cat_one_hot_encoder",
                "feature_dropper",
                "float_type_caster",
                "numerical_missing_indicator",
                "numerical_mean_imputer",
                "numerical_standard_scaler",
                "value_clipper",
            ]
        );
    }

    #[test]
    fn test_fit_transform_feature_names() {
        let mut pipeline = Pipeline::new(params());
        let matrix = pipeline.fit_transform(&training_frame()).unwrap();
        assert_eq!(
            matrix.names(),
            &["Carat Weight", "Cut_Ideal", "Cut_Good", "Carat Weight_na"]
        );
        assert_eq!(matrix.shape(), (4, 4));
    }

    #[test]
    fn test_transform_requires_fit() {
        let pipeline = Pipeline::new(params());
        assert!(matches!(
            pipeline.transform(&training_frame()),
            Err(PricerError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_transform_reorders_to_fit_layout() {
        let mut pipeline = Pipeline::new(params());
        pipeline.fit_transform(&training_frame()).unwrap();

        let request = df!(
            "Cut" => &["Good"],
            "Id" => &["9"],
            "Carat Weight" => &[1.5]
        )
        .unwrap();
        let matrix = pipeline.transform(&request).unwrap();
        assert_eq!(matrix.names(), pipeline.feature_names());
        assert_eq!(matrix.values()[[0, 2]], 1.0);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut pipeline = Pipeline::new(params());
        pipeline.fit_transform(&training_frame()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREPROCESSOR_FILE_NAME);
        pipeline.save(&path).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["format_version"] = serde_json::json!(99);
        std::fs::write(&path, json.to_string()).unwrap();

        assert!(matches!(
            Pipeline::load(&path),
            Err(PricerError::ArtifactError { .. })
        ));
    }
}
