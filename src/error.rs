//! Error types for the diamond pricer

use thiserror::Error;

/// Result type alias for pricer operations
pub type Result<T> = std::result::Result<T, PricerError>;

/// Main error type for training, evaluation and serving
#[derive(Error, Debug)]
pub enum PricerError {
    /// A request field is malformed or outside its allowed domain
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    /// A column a fitted transformer depends on is absent at transform time
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Feature matrix layout differs from what the model was fitted on
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A persisted pipeline or model could not be read back
    #[error("Artifact error ({path}): {reason}")]
    ArtifactError { path: String, reason: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PricerError {
    /// Shorthand for a field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PricerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, PricerError::Validation { .. })
    }
}

impl From<polars::error::PolarsError> for PricerError {
    fn from(err: polars::error::PolarsError) -> Self {
        PricerError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PricerError {
    fn from(err: serde_json::Error) -> Self {
        PricerError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PricerError {
    fn from(err: ndarray::ShapeError) -> Self {
        PricerError::ShapeMismatch {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
