//! Column selection

use super::ColumnTransformer;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the named columns are kept or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMode {
    Keep,
    Drop,
}

/// Keeps or drops a named set of columns.
///
/// Only columns actually present are touched, so optional inputs that are
/// missing from a request never cause an error here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSelector {
    columns: Vec<String>,
    mode: SelectorMode,
}

impl ColumnSelector {
    pub fn new(columns: Vec<String>, mode: SelectorMode) -> Self {
        Self { columns, mode }
    }

    /// Keep only the named columns
    pub fn keep(columns: Vec<String>) -> Self {
        Self::new(columns, SelectorMode::Keep)
    }

    /// Remove the named columns.
    ///
    /// Names absent from the frame are skipped rather than rejected, so a
    /// dropper built for training columns also applies to request frames.
    pub fn drop(columns: Vec<String>) -> Self {
        Self::new(columns, SelectorMode::Drop)
    }

    pub fn mode(&self) -> SelectorMode {
        self.mode
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl ColumnTransformer for ColumnSelector {
    fn fit(&mut self, _df: &DataFrame) -> Result<()> {
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        match self.mode {
            SelectorMode::Keep => {
                let retained: Vec<String> = df
                    .get_column_names()
                    .into_iter()
                    .filter(|name| self.columns.iter().any(|c| c.as_str() == name.as_str()))
                    .map(|name| name.to_string())
                    .collect();
                Ok(df.select(retained)?)
            }
            SelectorMode::Drop => {
                let mut result = df.clone();
                for name in super::present_columns(df, &self.columns) {
                    result = result.drop(name)?;
                }
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "Id" => &["a", "b"],
            "Carat Weight" => &[1.0, 1.5],
            "Cut" => &["Ideal", "Good"],
            "Price" => &[1000.0, 2000.0]
        )
        .unwrap()
    }

    #[test]
    fn test_keep_intersection_in_frame_order() {
        let selector = ColumnSelector::keep(vec![
            "Cut".to_string(),
            "Carat Weight".to_string(),
            "Color".to_string(),
        ]);
        let out = selector.transform(&sample()).unwrap();
        let names: Vec<String> = out.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Carat Weight", "Cut"]);
    }

    #[test]
    fn test_drop_ignores_absent_columns() {
        let selector = ColumnSelector::drop(vec!["Cut".to_string(), "Color".to_string()]);
        let out = selector.transform(&sample()).unwrap();
        assert_eq!(out.width(), 3);
        assert!(out.column("Cut").is_err());
    }
}
