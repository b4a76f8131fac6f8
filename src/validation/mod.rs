//! Input validation for single inference records
//!
//! A record arrives as a JSON object keyed by the dataset's attribute names.
//! Validation coerces it into a [`DiamondRecord`] or fails with a
//! [`PricerError::Validation`] naming the offending field.

mod domains;

pub use domains::{
    allowed_values, CARAT_WEIGHT_RANGE, CATEGORICAL_DOMAINS, CLARITY_VALUES, COLOR_VALUES,
    CUT_VALUES, POLISH_VALUES, REPORT_VALUES, SYMMETRY_VALUES,
};

use crate::error::{PricerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ID_FIELD: &str = "Id";
pub const CARAT_WEIGHT_FIELD: &str = "Carat Weight";

/// A validated diamond record, ready to be turned into a one-row frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiamondRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Carat Weight")]
    pub carat_weight: f64,
    #[serde(rename = "Cut")]
    pub cut: Option<String>,
    #[serde(rename = "Color")]
    pub color: Option<String>,
    #[serde(rename = "Clarity")]
    pub clarity: Option<String>,
    #[serde(rename = "Polish")]
    pub polish: Option<String>,
    #[serde(rename = "Symmetry")]
    pub symmetry: Option<String>,
    #[serde(rename = "Report")]
    pub report: Option<String>,
}

impl DiamondRecord {
    /// Validate and coerce a JSON object into a record
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            PricerError::validation("body", "request body must be a JSON object")
        })?;

        let id = parse_id(obj.get(ID_FIELD))?;
        let carat_weight = parse_carat_weight(obj.get(CARAT_WEIGHT_FIELD))?;

        let categorical = |field: &str| parse_categorical(field, obj.get(field));

        Ok(Self {
            id,
            carat_weight,
            cut: categorical("Cut")?,
            color: categorical("Color")?,
            clarity: categorical("Clarity")?,
            polish: categorical("Polish")?,
            symmetry: categorical("Symmetry")?,
            report: categorical("Report")?,
        })
    }

    /// Categorical fields paired with their attribute names, in schema order
    pub fn categorical_values(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("Cut", self.cut.as_deref()),
            ("Color", self.color.as_deref()),
            ("Clarity", self.clarity.as_deref()),
            ("Polish", self.polish.as_deref()),
            ("Symmetry", self.symmetry.as_deref()),
            ("Report", self.report.as_deref()),
        ]
    }

    /// One-row frame carrying every field; absent categoricals become nulls
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Column::new(ID_FIELD.into(), [self.id.as_str()]),
            Column::new(CARAT_WEIGHT_FIELD.into(), [self.carat_weight]),
        ];
        for (name, value) in self.categorical_values() {
            columns.push(Column::new(name.into(), [value]));
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn parse_id(value: Option<&Value>) -> Result<String> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Null) | None => Err(PricerError::validation(ID_FIELD, "field required")),
        Some(_) => Err(PricerError::validation(ID_FIELD, "must be a string")),
    }
}

fn parse_carat_weight(value: Option<&Value>) -> Result<f64> {
    let weight = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Null) | None => {
            return Err(PricerError::validation(CARAT_WEIGHT_FIELD, "field required"))
        }
        Some(_) => None,
    }
    .filter(|w| w.is_finite())
    .ok_or_else(|| PricerError::validation(CARAT_WEIGHT_FIELD, "must be a number"))?;

    let (min, max) = CARAT_WEIGHT_RANGE;
    if !(min..=max).contains(&weight) {
        return Err(PricerError::validation(
            CARAT_WEIGHT_FIELD,
            format!("must be between {} and {} (inclusive), got {}", min, max, weight),
        ));
    }

    Ok(weight)
}

fn parse_categorical(field: &str, value: Option<&Value>) -> Result<Option<String>> {
    let s = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(_) => return Err(PricerError::validation(field, "must be a string or null")),
    };

    let allowed = allowed_values(field).unwrap_or(&[]);
    if allowed.contains(&s.as_str()) {
        Ok(Some(s.clone()))
    } else {
        Err(PricerError::validation(
            field,
            format!("Variable {} must have one of these values: {:?}", field, allowed),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> Value {
        json!({
            "Id": "d-001",
            "Carat Weight": 1.2,
            "Cut": "Ideal",
            "Color": "E",
            "Clarity": "VS1",
            "Polish": "EX",
            "Symmetry": "VG",
            "Report": "GIA"
        })
    }

    #[test]
    fn test_valid_record() {
        let record = DiamondRecord::from_json(&full_record()).unwrap();
        assert_eq!(record.id, "d-001");
        assert_eq!(record.carat_weight, 1.2);
        assert_eq!(record.cut.as_deref(), Some("Ideal"));
    }

    #[test]
    fn test_carat_weight_out_of_range() {
        let mut value = full_record();
        value["Carat Weight"] = json!(0.5);
        let err = DiamondRecord::from_json(&value).unwrap_err();
        assert!(matches!(err, PricerError::Validation { ref field, .. } if field == "Carat Weight"));
    }

    #[test]
    fn test_carat_weight_bounds_inclusive() {
        let mut value = full_record();
        value["Carat Weight"] = json!(0.75);
        assert!(DiamondRecord::from_json(&value).is_ok());
        value["Carat Weight"] = json!(3.0);
        assert!(DiamondRecord::from_json(&value).is_ok());
        value["Carat Weight"] = json!(3.01);
        assert!(DiamondRecord::from_json(&value).is_err());
    }

    #[test]
    fn test_numeric_string_is_coerced() {
        let mut value = full_record();
        value["Carat Weight"] = json!("1.5");
        let record = DiamondRecord::from_json(&value).unwrap();
        assert_eq!(record.carat_weight, 1.5);

        value["Carat Weight"] = json!("heavy");
        assert!(DiamondRecord::from_json(&value).is_err());
    }

    #[test]
    fn test_unknown_color_names_field_and_domain() {
        let mut value = full_record();
        value["Color"] = json!("Z");
        match DiamondRecord::from_json(&value).unwrap_err() {
            PricerError::Validation { field, message } => {
                assert_eq!(field, "Color");
                assert!(message.contains("\"D\""));
                assert!(message.contains("\"I\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_categoricals_pass_through() {
        let value = json!({"Id": "x", "Carat Weight": 1.0, "Cut": null});
        let record = DiamondRecord::from_json(&value).unwrap();
        assert!(record.cut.is_none());
        assert!(record.report.is_none());
    }

    #[test]
    fn test_missing_id_rejected() {
        let value = json!({"Carat Weight": 1.0});
        let err = DiamondRecord::from_json(&value).unwrap_err();
        assert!(matches!(err, PricerError::Validation { ref field, .. } if field == "Id"));
    }

    #[test]
    fn test_to_dataframe_has_every_field() {
        let value = json!({"Id": 7, "Carat Weight": 1.0, "Color": "F"});
        let record = DiamondRecord::from_json(&value).unwrap();
        assert_eq!(record.id, "7");

        let df = record.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 8);
        assert_eq!(df.column("Cut").unwrap().null_count(), 1);
        assert_eq!(df.column("Color").unwrap().str().unwrap().get(0), Some("F"));
    }

    #[test]
    fn test_echo_uses_dataset_names() {
        let record = DiamondRecord::from_json(&full_record()).unwrap();
        let echoed = serde_json::to_value(&record).unwrap();
        assert_eq!(echoed["Carat Weight"], json!(1.2));
        assert_eq!(echoed["Cut"], json!("Ideal"));
    }
}
