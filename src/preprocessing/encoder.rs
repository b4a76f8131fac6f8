//! Bounded one-hot encoding

use super::{category_counts, put_column, string_values, ColumnTransformer};
use crate::error::{PricerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One-hot encodes the `max_categories` most frequent values of each column.
///
/// Indicator columns are named `<column>_<category>` and appended after the
/// existing columns in fit-time order, so the output layout never depends on
/// what a request happens to contain. Categories outside the top set encode
/// as all zeros. The base columns are left in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedOneHotEncoder {
    columns: Vec<String>,
    max_categories: usize,
    top_categories: Vec<(String, Vec<String>)>,
}

impl BoundedOneHotEncoder {
    pub fn new(columns: Vec<String>, max_categories: usize) -> Self {
        Self {
            columns,
            max_categories,
            top_categories: Vec::new(),
        }
    }

    /// Names of the indicator columns this encoder emits
    pub fn output_names(&self) -> Vec<String> {
        self.top_categories
            .iter()
            .flat_map(|(column, categories)| {
                categories
                    .iter()
                    .map(move |category| format!("{}_{}", column, category))
            })
            .collect()
    }
}

impl ColumnTransformer for BoundedOneHotEncoder {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let mut top_categories = Vec::with_capacity(self.columns.len());
        for name in super::present_columns(df, &self.columns) {
            let values = string_values(df, name)?;
            let top: Vec<String> = category_counts(&values)
                .into_iter()
                .take(self.max_categories)
                .map(|(category, _)| category)
                .collect();
            top_categories.push((name.to_string(), top));
        }

        self.top_categories = top_categories;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (name, categories) in &self.top_categories {
            if df.column(name).is_err() {
                return Err(PricerError::SchemaMismatch(format!(
                    "one-hot encoder was fitted on '{}' but the column is absent",
                    name
                )));
            }
            let values = string_values(df, name)?;
            for category in categories {
                let flags: Float64Chunked = values
                    .into_iter()
                    .map(|v| Some(if v == Some(category.as_str()) { 1.0 } else { 0.0 }))
                    .collect();
                let indicator_name = format!("{}_{}", name, category);
                put_column(
                    &mut result,
                    flags.with_name(indicator_name.as_str().into()).into_series(),
                )?;
            }
        }
        Ok(result)
    }
}
