//! Error types for the server

use crate::error::PricerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    /// The request body failed validation
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PricerError> for ServerError {
    fn from(err: PricerError) -> Self {
        if !err.is_client_error() {
            return ServerError::Internal(err.to_string());
        }
        match err {
            PricerError::Validation { field, message } => ServerError::Validation { field, message },
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": true,
                    "message": message,
                    "field": field,
                }),
            ),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": true,
                        "message": "Prediction failed. Check server logs for details.",
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
