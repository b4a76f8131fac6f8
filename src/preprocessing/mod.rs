//! Feature transformation pipeline
//!
//! Turns raw diamond records (string and float attributes, possibly null,
//! possibly missing whole columns) into a fixed-width numeric feature matrix:
//! - Column selection and type casting
//! - Categorical imputation (missing tag, most frequent)
//! - Rare label grouping and bounded one-hot encoding
//! - Numerical missing indicators and mean imputation
//! - Standard scaling and value clipping
//!
//! Every transformer is fitted once and is read-only afterwards, so a fitted
//! [`Pipeline`] can serve concurrent requests without locking.

mod caster;
mod config;
mod encoder;
mod imputer;
mod matrix;
mod outlier;
mod pipeline;
mod rare_label;
mod scaler;
mod selector;

pub use caster::{CastType, TypeCaster};
pub use config::PipelineParams;
pub use encoder::BoundedOneHotEncoder;
pub use imputer::{CategoricalImputer, CategoricalStrategy, MeanImputer, MissingIndicator};
pub use matrix::FeatureMatrix;
pub use outlier::ValueClipper;
pub use pipeline::{NamedStep, Pipeline, PipelineStep, PIPELINE_FORMAT_VERSION, PREPROCESSOR_FILE_NAME};
pub use rare_label::RareLabelGrouper;
pub use scaler::StandardScaler;
pub use selector::{ColumnSelector, SelectorMode};

use crate::error::{PricerError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Sentinel category used by the missing-tag imputer
pub const MISSING_LABEL: &str = "missing";

/// Bucket that rare and unseen categories collapse into
pub const RARE_LABEL: &str = "rare";

/// A stateful column transformer.
///
/// `fit` establishes the transformer's statistics from training data;
/// `transform` is a pure function of its input and that state.
pub trait ColumnTransformer {
    /// Learn state from the data
    fn fit(&mut self, df: &DataFrame) -> Result<()>;

    /// Apply the learned state
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}

/// Names from `wanted` that exist in the frame, in `wanted` order
pub(crate) fn present_columns<'a>(df: &DataFrame, wanted: &'a [String]) -> Vec<&'a str> {
    wanted
        .iter()
        .filter(|name| df.column(name.as_str()).is_ok())
        .map(|name| name.as_str())
        .collect()
}

/// Fail with `FeatureNotFound` for the first configured column absent at fit time
pub(crate) fn require_columns(df: &DataFrame, wanted: &[String]) -> Result<()> {
    match wanted.iter().find(|name| df.column(name.as_str()).is_err()) {
        Some(name) => Err(PricerError::FeatureNotFound(name.clone())),
        None => Ok(()),
    }
}

/// Column values as f64, casting if needed (unparsable values become null)
pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df
        .column(name)
        .map_err(|_| PricerError::FeatureNotFound(name.to_string()))?;
    let casted = column.cast(&DataType::Float64)?;
    Ok(casted.f64()?.clone())
}

/// Column values as strings, casting if needed
pub(crate) fn string_values(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = df
        .column(name)
        .map_err(|_| PricerError::FeatureNotFound(name.to_string()))?;
    let casted = column.cast(&DataType::String)?;
    Ok(casted.str()?.clone())
}

/// Non-null category counts, most frequent first, ties broken by ascending value
pub(crate) fn category_counts(ca: &StringChunked) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    // BTreeMap iteration is already ascending by value, so a stable sort on
    // count alone keeps the lexicographic tie-break.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Replace (or append) a column in place
pub(crate) fn put_column(df: &mut DataFrame, series: Series) -> Result<()> {
    df.with_column(series)?;
    Ok(())
}
