//! Pipeline parameters

use crate::error::{PricerError, Result};
use crate::schema::DataSchema;
use crate::training::ModelConfig;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column groups and thresholds a [`super::Pipeline`] is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// All categorical predictors
    pub categorical_vars: Vec<String>,

    /// All numerical predictors
    pub numerical_vars: Vec<String>,

    /// Categoricals whose nulls become the `"missing"` category
    pub cat_vars_missing_tag: Vec<String>,

    /// Categoricals whose nulls become the most frequent value
    pub cat_vars_frequent: Vec<String>,

    /// Numericals that get a `<name>_na` indicator and mean imputation
    pub num_vars_na: Vec<String>,

    /// Minimum frequency share for a category to escape the rare bucket
    pub rare_category_threshold: f64,

    /// Top-K bound for one-hot encoding
    pub max_one_hot_categories: usize,

    /// Scaled values are clipped into `[-clip_bound, clip_bound]`
    pub clip_bound: f64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            categorical_vars: Vec::new(),
            numerical_vars: Vec::new(),
            cat_vars_missing_tag: Vec::new(),
            cat_vars_frequent: Vec::new(),
            num_vars_na: Vec::new(),
            rare_category_threshold: 0.01,
            max_one_hot_categories: 10,
            clip_bound: 4.0,
        }
    }
}

impl PipelineParams {
    pub fn new(categorical_vars: Vec<String>, numerical_vars: Vec<String>) -> Self {
        Self {
            categorical_vars,
            numerical_vars,
            ..Default::default()
        }
    }

    pub fn with_missing_tag_vars(mut self, vars: Vec<String>) -> Self {
        self.cat_vars_missing_tag = vars;
        self
    }

    pub fn with_frequent_vars(mut self, vars: Vec<String>) -> Self {
        self.cat_vars_frequent = vars;
        self
    }

    pub fn with_num_na_vars(mut self, vars: Vec<String>) -> Self {
        self.num_vars_na = vars;
        self
    }

    pub fn with_rare_threshold(mut self, threshold: f64) -> Self {
        self.rare_category_threshold = threshold;
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

    /// Derive the column groups from training data.
    ///
    /// Categoricals with a null share at or above `missing_tag_threshold` are
    /// imputed with the missing tag; every other categorical falls back to
    /// the most frequent value so that nulls at serving time are always
    /// filled. Numericals with any null get an indicator and mean imputation.
    pub fn from_training_data(df: &DataFrame, schema: &DataSchema, config: &ModelConfig) -> Result<Self> {
        let categorical_vars = schema.categorical_vars();
        let numerical_vars = schema.numerical_vars();
        let n_rows = df.height();
        if n_rows == 0 {
            return Err(PricerError::DataError("training data is empty".to_string()));
        }

        let null_share = |name: &str| -> Result<f64> {
            let column = df
                .column(name)
                .map_err(|_| PricerError::FeatureNotFound(name.to_string()))?;
            Ok(column.null_count() as f64 / n_rows as f64)
        };

        let mut cat_vars_missing_tag = Vec::new();
        let mut cat_vars_frequent = Vec::new();
        for name in &categorical_vars {
            if null_share(name)? >= config.missing_tag_threshold {
                cat_vars_missing_tag.push(name.clone());
            } else {
                cat_vars_frequent.push(name.clone());
            }
        }

        let mut num_vars_na = Vec::new();
        for name in &numerical_vars {
            if null_share(name)? > 0.0 {
                num_vars_na.push(name.clone());
            }
        }

        tracing::debug!(
            missing_tag = ?cat_vars_missing_tag,
            frequent = ?cat_vars_frequent,
            num_na = ?num_vars_na,
            "Derived pipeline parameters"
        );

        Ok(Self::new(categorical_vars, numerical_vars)
            .with_missing_tag_vars(cat_vars_missing_tag)
            .with_frequent_vars(cat_vars_frequent)
            .with_num_na_vars(num_vars_na)
            .with_rare_threshold(config.rare_category_threshold)
            .with_max_one_hot(config.max_one_hot_categories)
            .with_clip_bound(config.clip_bound))
    }

    /// Predictors in the order the first selector keeps them
    pub fn predictors(&self) -> Vec<String> {
        self.categorical_vars
            .iter()
            .chain(self.numerical_vars.iter())
            .cloned()
            .collect()
    }
}
