//! Outlier clipping

use super::{float_values, present_columns, put_column, ColumnTransformer};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Clamps numeric columns into `[min, max]`; either bound may be open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueClipper {
    columns: Vec<String>,
    min: Option<f64>,
    max: Option<f64>,
}

impl ValueClipper {
    pub fn new(columns: Vec<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self { columns, min, max }
    }

    /// Symmetric clipping into `[-bound, bound]`
    pub fn symmetric(columns: Vec<String>, bound: f64) -> Self {
        Self::new(columns, Some(-bound.abs()), Some(bound.abs()))
    }

    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.min, self.max)
    }

    fn clip(&self, v: f64) -> f64 {
        let v = self.min.map_or(v, |lo| v.max(lo));
        self.max.map_or(v, |hi| v.min(hi))
    }
}

impl ColumnTransformer for ValueClipper {
    fn fit(&mut self, _df: &DataFrame) -> Result<()> {
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for name in present_columns(df, &self.columns) {
            let clipped = float_values(df, name)?.apply_values(|v| self.clip(v));
            put_column(&mut result, clipped.with_name(name.into()).into_series())?;
        }
        Ok(result)
    }
}
