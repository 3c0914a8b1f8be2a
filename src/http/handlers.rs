//! HTTP request handlers.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::routes::AppState;
use crate::application::ModelInfo;
use crate::domain::{PatientRecord, PredictionResult, ValidationError};

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub prediction: &'static str,
    pub health: &'static str,
    pub model_info: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
    pub model_status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ModelInfoResponse {
    Loaded(ModelInfo),
    Unloaded { status: &'static str },
}

fn model_status(state: &AppState) -> &'static str {
    if state.inference.is_model_loaded() {
        "loaded"
    } else {
        "not loaded"
    }
}

/// GET /
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Heart Disease Prediction API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            prediction: "/predict",
            health: "/health",
            model_info: "/model-info",
        },
        model_status: model_status(&state),
    })
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.inference.is_model_loaded(),
    })
}

/// POST /predict
///
/// The body is taken as raw bytes so that malformed JSON, wrong types and
/// range violations all come back through the same 422 shape.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    let raw: Value =
        serde_json::from_slice(&body).map_err(|e| ValidationError::json_invalid(&e))?;
    let record = PatientRecord::validate(&raw)?;
    let result = state.inference.predict(&record)?;
    Ok(Json(result))
}

/// GET /model-info
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    Json(match state.inference.model_info() {
        Some(info) => ModelInfoResponse::Loaded(info),
        None => ModelInfoResponse::Unloaded {
            status: "Model not loaded",
        },
    })
}
