//! HTTP transport: axum router, handlers and error mapping.
//!
//! # Routes
//!
//! - `GET /` - API description and model status
//! - `GET /health` - Liveness plus whether a model is loaded
//! - `POST /predict` - Validate a patient record and score it
//! - `GET /model-info` - Metadata about the loaded model

mod error;
mod handlers;
mod routes;

pub use error::{ApiError, ErrorDetail};
pub use routes::{create_router, AppState};
