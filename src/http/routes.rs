//! Router configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::application::InferenceService;

/// Application state shared across handlers
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub inference: InferenceService,
}

impl AppState {
    #[must_use]
    pub fn new(inference: InferenceService) -> Self {
        Self { inference }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser clients are served from other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/model-info", get(handlers::model_info))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
