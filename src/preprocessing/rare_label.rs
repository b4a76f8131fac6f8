//! Rare category grouping

use super::{category_counts, put_column, require_columns, string_values, ColumnTransformer, RARE_LABEL};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Learned frequent set for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FrequentLabels {
    /// False when the column had too few distinct values to group
    grouped: bool,
    labels: Vec<String>,
}

/// Collapses infrequent categories into `"rare"`.
///
/// A category is frequent when its share of the non-null fit-time values is
/// at least `tolerance`. Values outside the frequent set at transform time,
/// including categories never seen during fit, become `"rare"`. Nulls are
/// left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RareLabelGrouper {
    columns: Vec<String>,
    tolerance: f64,
    n_categories: usize,
    frequent: BTreeMap<String, FrequentLabels>,
}

impl RareLabelGrouper {
    pub fn new(columns: Vec<String>, tolerance: f64) -> Self {
        Self {
            columns,
            tolerance,
            n_categories: 1,
            frequent: BTreeMap::new(),
        }
    }

    /// Columns with at most this many distinct values are never grouped
    pub fn with_n_categories(mut self, n_categories: usize) -> Self {
        self.n_categories = n_categories;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Frequent labels for a fitted column
    pub fn frequent_labels(&self, column: &str) -> Option<&[String]> {
        self.frequent.get(column).map(|f| f.labels.as_slice())
    }
}

impl ColumnTransformer for RareLabelGrouper {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        require_columns(df, &self.columns)?;

        let mut frequent = BTreeMap::new();
        for name in &self.columns {
            let values = string_values(df, name)?;
            let counts = category_counts(&values);
            let total: usize = counts.iter().map(|(_, n)| n).sum();

            let state = if counts.len() <= self.n_categories {
                FrequentLabels {
                    grouped: false,
                    labels: counts.into_iter().map(|(label, _)| label).collect(),
                }
            } else {
                let mut labels: Vec<String> = counts
                    .into_iter()
                    .filter(|(_, n)| *n as f64 / total as f64 >= self.tolerance)
                    .map(|(label, _)| label)
                    .collect();
                labels.sort();
                FrequentLabels {
                    grouped: true,
                    labels,
                }
            };

            tracing::debug!(
                column = %name,
                frequent = state.labels.len(),
                grouped = state.grouped,
                "Fitted rare label grouper"
            );
            frequent.insert(name.clone(), state);
        }

        self.frequent = frequent;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (name, state) in &self.frequent {
            if !state.grouped || df.column(name).is_err() {
                continue;
            }
            let values = string_values(df, name)?;
            let grouped: StringChunked = values
                .into_iter()
                .map(|v| {
                    v.map(|label| {
                        if state.labels.binary_search_by(|l| l.as_str().cmp(label)).is_ok() {
                            label
                        } else {
                            RARE_LABEL
                        }
                    })
                })
                .collect();
            put_column(&mut result, grouped.with_name(name.as_str().into()).into_series())?;
        }
        Ok(result)
    }
}
