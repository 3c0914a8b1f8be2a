//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifact`: JSON model artifacts with manifest/signature verification
//! - `sanitize`: Redaction of clinical values and secrets in logs

pub mod artifact;
pub mod sanitize;

pub use artifact::{load_model, load_model_state, ModelLoadError};
