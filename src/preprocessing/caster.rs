//! Column type casting

use super::{present_columns, put_column, ColumnTransformer};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Target type of a cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastType {
    String,
    Float,
}

impl CastType {
    fn dtype(self) -> DataType {
        match self {
            CastType::String => DataType::String,
            CastType::Float => DataType::Float64,
        }
    }
}

/// Casts named columns to a single target type.
///
/// Absent columns are ignored. Values that cannot be parsed become null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCaster {
    columns: Vec<String>,
    cast_type: CastType,
}

impl TypeCaster {
    pub fn new(columns: Vec<String>, cast_type: CastType) -> Self {
        Self { columns, cast_type }
    }

    pub fn cast_type(&self) -> CastType {
        self.cast_type
    }
}

impl ColumnTransformer for TypeCaster {
    fn fit(&mut self, _df: &DataFrame) -> Result<()> {
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let dtype = self.cast_type.dtype();
        let mut result = df.clone();
        for name in present_columns(df, &self.columns) {
            let column = df.column(name)?;
            if column.dtype() == &dtype {
                continue;
            }
            let casted = column.as_materialized_series().cast(&dtype)?;
            put_column(&mut result, casted)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_to_string_and_float() {
        let df = df!(
            "Carat Weight" => &["1.25", "bad"],
            "Report" => &[1i64, 2]
        )
        .unwrap();

        let floats = TypeCaster::new(vec!["Carat Weight".to_string()], CastType::Float);
        let out = floats.transform(&df).unwrap();
        let weights = out.column("Carat Weight").unwrap().f64().unwrap().clone();
        assert_eq!(weights.get(0), Some(1.25));
        assert_eq!(weights.get(1), None);

        let strings = TypeCaster::new(vec!["Report".to_string(), "Cut".to_string()], CastType::String);
        let out = strings.transform(&df).unwrap();
        assert_eq!(out.column("Report").unwrap().dtype(), &DataType::String);
        assert_eq!(out.width(), 2);
    }
}
