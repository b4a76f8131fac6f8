//! Standard scaling

use super::{float_values, put_column, require_columns, ColumnTransformer};
use crate::error::{PricerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters for a fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,
    scale: f64,
}

/// z-score scaling: `(x - mean) / std` with the population standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    params: BTreeMap<String, ScalerParams>,
}

impl StandardScaler {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            params: BTreeMap::new(),
        }
    }

    /// Fitted `(mean, scale)` for a column
    pub fn params(&self, column: &str) -> Option<(f64, f64)> {
        self.params.get(column).map(|p| (p.center, p.scale))
    }
}

impl ColumnTransformer for StandardScaler {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        require_columns(df, &self.columns)?;

        let mut params = BTreeMap::new();
        for name in &self.columns {
            let ca = float_values(df, name)?;
            let center = ca.mean().unwrap_or(0.0);
            let std = ca.std(0).unwrap_or(1.0);
            // Constant columns would otherwise divide by zero
            let scale = if std == 0.0 || !std.is_finite() { 1.0 } else { std };
            params.insert(name.clone(), ScalerParams { center, scale });
        }

        self.params = params;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (name, p) in &self.params {
            if df.column(name).is_err() {
                return Err(PricerError::SchemaMismatch(format!(
                    "scaler was fitted on '{}' but the column is absent",
                    name
                )));
            }
            let ca = float_values(df, name)?;
            let scaled = ca.apply_values(|v| (v - p.center) / p.scale);
            put_column(&mut result, scaled.with_name(name.as_str().into()).into_series())?;
        }
        Ok(result)
    }
}
