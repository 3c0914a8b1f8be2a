//! Mapping from service errors to HTTP responses.
//!
//! Bodies follow the shape API clients of the service already parse:
//! `{"detail": [{"loc": [...], "msg": ..., "type": ...}]}` for 422 and
//! `{"detail": "..."}` for 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::application::InferenceError;
use crate::domain::{FieldViolation, ValidationError};

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// One entry of a 422 `detail` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub loc: Vec<&'static str>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<&FieldViolation> for ErrorDetail {
    fn from(violation: &FieldViolation) -> Self {
        let loc = if violation.is_body() {
            vec![FieldViolation::BODY]
        } else {
            vec![FieldViolation::BODY, violation.field()]
        };

        Self {
            loc,
            msg: violation.message().to_string(),
            kind: violation.kind().code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(e) => {
                tracing::debug!(fields = ?e.fields().collect::<Vec<_>>(), "Rejected request");
                let detail: Vec<ErrorDetail> = e.violations().iter().map(ErrorDetail::from).collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": detail })),
                )
                    .into_response()
            }
            Self::Inference(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": e.to_string() })),
            )
                .into_response(),
        }
    }
}
