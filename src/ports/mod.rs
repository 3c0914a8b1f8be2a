//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the pre-trained classifier.

mod model;

pub use model::{
    ModelDescriptor, ModelError, ModelState, ProbabilisticClassifier, RiskClassifier,
    ScoringModel,
};
