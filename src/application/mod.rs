//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use case of the service: validated risk inference.

mod inference;

pub use inference::{to_feature_vector, InferenceError, InferenceService, ModelInfo};
