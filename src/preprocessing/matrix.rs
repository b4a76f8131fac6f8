//! Named numeric feature matrix

use crate::error::{PricerError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed-width numeric matrix with ordered column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(PricerError::ShapeMismatch {
                expected: format!("{} columns", names.len()),
                actual: format!("{} columns", values.ncols()),
            });
        }
        Ok(Self { names, values })
    }

    /// Gather `names` from a frame in that order.
    ///
    /// A missing column is a `SchemaMismatch`. Null cells become 0.0.
    pub fn from_dataframe(df: &DataFrame, names: &[String]) -> Result<Self> {
        let n_rows = df.height();
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let column = df.column(name).map_err(|_| {
                PricerError::SchemaMismatch(format!("feature '{}' is missing from the transformed data", name))
            })?;
            let casted = column.cast(&DataType::Float64)?;
            columns.push(casted.f64()?.clone());
        }

        let values = Array2::from_shape_fn((n_rows, names.len()), |(i, j)| {
            columns[j].get(i).unwrap_or(0.0)
        });

        Ok(Self {
            names: names.to_vec(),
            values,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }
}
