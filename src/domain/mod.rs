//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. Patient records are validated on construction;
//! prediction results are derived, never mutated.

mod patient;
mod prediction;
mod validation;

pub use patient::{FeatureVector, PatientRecord, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::{
    PredictionResult, RiskLevel, HIGH_RISK_MESSAGE, LOW_RISK_MESSAGE, NEGATIVE_LABEL,
    POSITIVE_LABEL,
};
pub use validation::{FieldViolation, ValidationError, ViolationKind};
