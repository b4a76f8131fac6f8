//! Missing value imputation

use super::{
    category_counts, float_values, put_column, require_columns, string_values, ColumnTransformer,
    MISSING_LABEL,
};
use crate::error::{PricerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a categorical imputer chooses its fill value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalStrategy {
    /// Replace nulls with the literal `"missing"` category
    MissingTag,
    /// Replace nulls with the most frequent fit-time value
    MostFrequent,
}

/// Fills nulls in string columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalImputer {
    strategy: CategoricalStrategy,
    columns: Vec<String>,
    fill_values: BTreeMap<String, String>,
}

impl CategoricalImputer {
    pub fn new(columns: Vec<String>, strategy: CategoricalStrategy) -> Self {
        Self {
            strategy,
            columns,
            fill_values: BTreeMap::new(),
        }
    }

    pub fn missing_tag(columns: Vec<String>) -> Self {
        Self::new(columns, CategoricalStrategy::MissingTag)
    }

    pub fn most_frequent(columns: Vec<String>) -> Self {
        Self::new(columns, CategoricalStrategy::MostFrequent)
    }

    pub fn strategy(&self) -> CategoricalStrategy {
        self.strategy
    }

    /// Fitted fill value for a column
    pub fn fill_value(&self, column: &str) -> Option<&str> {
        self.fill_values.get(column).map(String::as_str)
    }
}

impl ColumnTransformer for CategoricalImputer {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        require_columns(df, &self.columns)?;

        let mut fill_values = BTreeMap::new();
        for name in &self.columns {
            let fill = match self.strategy {
                CategoricalStrategy::MissingTag => MISSING_LABEL.to_string(),
                CategoricalStrategy::MostFrequent => {
                    let values = string_values(df, name)?;
                    category_counts(&values)
                        .into_iter()
                        .next()
                        .map(|(value, _)| value)
                        .ok_or_else(|| {
                            PricerError::PreprocessingError(format!(
                                "cannot compute most frequent value of '{}': column is entirely null",
                                name
                            ))
                        })?
                }
            };
            fill_values.insert(name.clone(), fill);
        }

        self.fill_values = fill_values;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (name, fill) in &self.fill_values {
            if df.column(name).is_err() {
                continue;
            }
            let values = string_values(df, name)?;
            if values.null_count() == 0 {
                continue;
            }
            let filled: StringChunked = values
                .into_iter()
                .map(|v| Some(v.unwrap_or(fill.as_str())))
                .collect();
            put_column(&mut result, filled.with_name(name.as_str().into()).into_series())?;
        }
        Ok(result)
    }
}

/// Replaces nulls in numeric columns with the fit-time mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanImputer {
    columns: Vec<String>,
    means: BTreeMap<String, f64>,
}

impl MeanImputer {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            means: BTreeMap::new(),
        }
    }

    pub fn mean(&self, column: &str) -> Option<f64> {
        self.means.get(column).copied()
    }
}

impl ColumnTransformer for MeanImputer {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        require_columns(df, &self.columns)?;

        let mut means = BTreeMap::new();
        for name in &self.columns {
            let mean = float_values(df, name)?.mean().ok_or_else(|| {
                PricerError::PreprocessingError(format!(
                    "cannot compute mean of '{}': column is entirely null",
                    name
                ))
            })?;
            means.insert(name.clone(), mean);
        }

        self.means = means;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (name, mean) in &self.means {
            if df.column(name).is_err() {
                return Err(PricerError::SchemaMismatch(format!(
                    "mean imputer was fitted on '{}' but the column is absent",
                    name
                )));
            }
            let values = float_values(df, name)?;
            let filled: Float64Chunked = values
                .into_iter()
                .map(|v| Some(v.unwrap_or(*mean)))
                .collect();
            put_column(&mut result, filled.with_name(name.as_str().into()).into_series())?;
        }
        Ok(result)
    }
}

/// Appends a `<column>_na` 0/1 indicator for each configured numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingIndicator {
    columns: Vec<String>,
    fitted_columns: Vec<String>,
}

impl MissingIndicator {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            fitted_columns: Vec::new(),
        }
    }

    pub fn indicator_name(column: &str) -> String {
        format!("{}_na", column)
    }

    /// Columns that receive an indicator, fixed at fit
    pub fn fitted_columns(&self) -> &[String] {
        &self.fitted_columns
    }
}

impl ColumnTransformer for MissingIndicator {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.fitted_columns = super::present_columns(df, &self.columns)
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for name in &self.fitted_columns {
            let column = df.column(name).map_err(|_| {
                PricerError::SchemaMismatch(format!(
                    "missing indicator was fitted on '{}' but the column is absent",
                    name
                ))
            })?;
            let flags: Float64Chunked = column
                .is_null()
                .into_iter()
                .map(|is_null| Some(if is_null == Some(true) { 1.0 } else { 0.0 }))
                .collect();
            let indicator = flags
                .with_name(Self::indicator_name(name).as_str().into())
                .into_series();
            put_column(&mut result, indicator)?;
        }
        Ok(result)
    }
}
