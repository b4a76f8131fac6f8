//! HTTP request handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::evaluation::round4;
use crate::validation::DiamondRecord;

use super::error::{Result, ServerError};
use super::state::AppState;

pub const PING_MESSAGE: &str = "Random Forest prediction service is running!";

/// Response for `POST /predict`
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub data: DiamondRecord,
    pub prediction: f64,
}

pub async fn ping() -> Json<Value> {
    Json(json!({ "message": PING_MESSAGE }))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(body) = body.map_err(|e| ServerError::Validation {
        field: "body".to_string(),
        message: e.body_text(),
    })?;

    let record = DiamondRecord::from_json(&body)?;
    debug!(id = %record.id, "Validated prediction request");

    let worker = Arc::clone(&state);
    let request = record.clone();
    let prediction = tokio::task::spawn_blocking(move || worker.predict_one(&request))
        .await
        .map_err(|e| ServerError::Internal(format!("prediction task failed: {}", e)))??;
    if !prediction.is_finite() {
        return Err(ServerError::Internal(format!(
            "model produced a non-finite prediction for record {}",
            record.id
        )));
    }

    let prediction = round4(prediction);
    info!(id = %record.id, prediction, "Served prediction");

    Ok(Json(PredictResponse {
        data: record,
        prediction,
    }))
}
