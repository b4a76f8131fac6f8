//! Data schema: which attribute plays which role
//!
//! The schema is supplied externally as JSON and is never inferred from data.
//! Layout:
//!
//! ```json
//! {
//!   "inputDatasets": {
//!     "regressionBaseMainInput": {
//!       "idField": "Id",
//!       "targetField": "Price",
//!       "predictorFields": [
//!         { "fieldName": "Carat Weight", "dataType": "NUMERIC" },
//!         { "fieldName": "Cut", "dataType": "CATEGORICAL" }
//!       ]
//!     }
//!   }
//! }
//! ```

use crate::error::{PricerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Role an attribute plays in training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeRole {
    Categorical,
    Numerical,
    Target,
    Id,
}

/// Declared data type of a predictor field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Categorical,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictorField {
    pub field_name: String,
    pub data_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionInput {
    #[serde(default = "default_id_field")]
    pub id_field: String,
    pub target_field: String,
    #[serde(default)]
    pub predictor_fields: Vec<PredictorField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDatasets {
    pub regression_base_main_input: RegressionInput,
}

/// Top-level data schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSchema {
    pub input_datasets: InputDatasets,
}

fn default_id_field() -> String {
    "Id".to_string()
}

impl Default for DataSchema {
    /// Schema of the diamond price dataset
    fn default() -> Self {
        let numeric = |name: &str| PredictorField {
            field_name: name.to_string(),
            data_type: FieldType::Numeric,
        };
        let categorical = |name: &str| PredictorField {
            field_name: name.to_string(),
            data_type: FieldType::Categorical,
        };

        Self {
            input_datasets: InputDatasets {
                regression_base_main_input: RegressionInput {
                    id_field: default_id_field(),
                    target_field: "Price".to_string(),
                    predictor_fields: vec![
                        numeric("Carat Weight"),
                        categorical("Cut"),
                        categorical("Color"),
                        categorical("Clarity"),
                        categorical("Polish"),
                        categorical("Symmetry"),
                        categorical("Report"),
                    ],
                },
            },
        }
    }
}

impl DataSchema {
    /// Build a schema from explicit attribute lists
    pub fn new(
        target_field: impl Into<String>,
        categorical_vars: &[&str],
        numerical_vars: &[&str],
    ) -> Self {
        let mut predictor_fields = Vec::with_capacity(categorical_vars.len() + numerical_vars.len());
        for name in numerical_vars {
            predictor_fields.push(PredictorField {
                field_name: name.to_string(),
                data_type: FieldType::Numeric,
            });
        }
        for name in categorical_vars {
            predictor_fields.push(PredictorField {
                field_name: name.to_string(),
                data_type: FieldType::Categorical,
            });
        }

        Self {
            input_datasets: InputDatasets {
                regression_base_main_input: RegressionInput {
                    id_field: default_id_field(),
                    target_field: target_field.into(),
                    predictor_fields,
                },
            },
        }
    }

    /// Load a schema from a JSON file, or from the only `.json` file in a directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_json_file(path.as_ref())?;
        let json = std::fs::read_to_string(&path)?;
        let schema: Self = serde_json::from_str(&json)?;
        schema.validate()?;
        Ok(schema)
    }

    fn input(&self) -> &RegressionInput {
        &self.input_datasets.regression_base_main_input
    }

    pub fn target_field(&self) -> &str {
        &self.input().target_field
    }

    pub fn id_field(&self) -> &str {
        &self.input().id_field
    }

    /// Categorical predictors, in declaration order
    pub fn categorical_vars(&self) -> Vec<String> {
        self.fields_of(FieldType::Categorical)
    }

    /// Numerical predictors, in declaration order
    pub fn numerical_vars(&self) -> Vec<String> {
        self.fields_of(FieldType::Numeric)
    }

    /// Role of a named attribute, if the schema knows it
    pub fn role_of(&self, name: &str) -> Option<AttributeRole> {
        if name == self.target_field() {
            return Some(AttributeRole::Target);
        }
        if name == self.id_field() {
            return Some(AttributeRole::Id);
        }
        self.input()
            .predictor_fields
            .iter()
            .find(|f| f.field_name == name)
            .map(|f| match f.data_type {
                FieldType::Categorical => AttributeRole::Categorical,
                FieldType::Numeric => AttributeRole::Numerical,
            })
    }

    /// Every attribute must have exactly one role
    pub fn validate(&self) -> Result<()> {
        let input = self.input();
        if input.target_field.is_empty() {
            return Err(PricerError::ConfigError("targetField must not be empty".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        seen.insert(input.target_field.as_str());
        if !seen.insert(input.id_field.as_str()) {
            return Err(PricerError::ConfigError(format!(
                "idField and targetField are both '{}'",
                input.id_field
            )));
        }
        for field in &input.predictor_fields {
            if !seen.insert(field.field_name.as_str()) {
                return Err(PricerError::ConfigError(format!(
                    "attribute '{}' is assigned more than one role",
                    field.field_name
                )));
            }
        }

        Ok(())
    }

    fn fields_of(&self, data_type: FieldType) -> Vec<String> {
        self.input()
            .predictor_fields
            .iter()
            .filter(|f| f.data_type == data_type)
            .map(|f| f.field_name.clone())
            .collect()
    }
}

/// Accept either a file path or a directory containing exactly one `.json` file
pub(crate) fn resolve_json_file(path: &Path) -> Result<std::path::PathBuf> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }

    let mut candidates: Vec<std::path::PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    candidates.sort();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(PricerError::ConfigError(format!(
            "no .json file found in {}",
            path.display()
        ))),
        n => Err(PricerError::ConfigError(format!(
            "expected one .json file in {}, found {}",
            path.display(),
            n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_roles() {
        let schema = DataSchema::default();
        assert_eq!(schema.target_field(), "Price");
        assert_eq!(schema.numerical_vars(), vec!["Carat Weight".to_string()]);
        assert_eq!(schema.categorical_vars().len(), 6);
        assert_eq!(schema.role_of("Cut"), Some(AttributeRole::Categorical));
        assert_eq!(schema.role_of("Id"), Some(AttributeRole::Id));
        assert_eq!(schema.role_of("Price"), Some(AttributeRole::Target));
        assert_eq!(schema.role_of("Depth"), None);
    }

    #[test]
    fn test_schema_json_layout() {
        let json = r#"{
            "inputDatasets": {
                "regressionBaseMainInput": {
                    "idField": "Id",
                    "targetField": "Price",
                    "predictorFields": [
                        {"fieldName": "Carat Weight", "dataType": "NUMERIC"},
                        {"fieldName": "Cut", "dataType": "CATEGORICAL"}
                    ]
                }
            }
        }"#;
        let schema: DataSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.categorical_vars(), vec!["Cut".to_string()]);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let schema = DataSchema::new("Price", &["Cut", "Price"], &["Carat Weight"]);
        assert!(matches!(schema.validate(), Err(PricerError::ConfigError(_))));
    }
}
