//! Inference service: Turns validated patient records into predictions.
//!
//! This service coordinates:
//! - Feature ordering (the contract with the trained model)
//! - Label prediction
//! - Positive-class probability lookup, when the model supports it
//! - Risk level and message derivation

use serde::Serialize;

use crate::domain::{
    FeatureVector, PatientRecord, PredictionResult, FEATURE_NAMES, NEGATIVE_LABEL, POSITIVE_LABEL,
};
use crate::ports::{ModelState, ProbabilisticClassifier, ScoringModel};

/// Errors surfaced by the inference pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("Model not loaded. Please ensure model.pkl is in the correct directory.")]
    ModelUnavailable,

    #[error("Prediction error: {0}")]
    Prediction(String),
}

/// Descriptive metadata about the loaded model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub features: Vec<&'static str>,
    pub has_probability: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
    /// Present (and `true`) only when the model exposes importances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_feature_importance: Option<bool>,
}

/// Encode a record in the order the model was trained on.
///
/// This sequence is fixed; it must match `FEATURE_NAMES` and is never
/// derived from field names at runtime.
#[must_use]
pub fn to_feature_vector(record: &PatientRecord) -> FeatureVector {
    FeatureVector::new([
        record.age,
        f64::from(record.sex),
        f64::from(record.cp),
        record.trestbps,
        record.chol,
        f64::from(record.fbs),
        f64::from(record.restecg),
        record.thalach,
        f64::from(record.exang),
        record.oldpeak,
        f64::from(record.slope),
        f64::from(record.ca),
        f64::from(record.thal),
    ])
}

/// Service for running risk inference against the process-wide model.
///
/// Cheap to clone; the model is shared read-only.
#[derive(Debug, Clone, Default)]
pub struct InferenceService {
    model: ModelState,
}

impl InferenceService {
    /// Create a new inference service around the startup model state.
    #[must_use]
    pub fn new(model: ModelState) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn is_model_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    fn loaded_model(&self) -> Result<&ScoringModel, InferenceError> {
        self.model.model().ok_or(InferenceError::ModelUnavailable)
    }

    /// Predict heart disease risk for a validated record.
    ///
    /// The model state is checked before the feature vector is built.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` when no model is loaded, or `Prediction`
    /// when scoring fails.
    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, InferenceError> {
        let model = self.loaded_model()?;
        let features = to_feature_vector(record);
        Self::score_with(model, &features)
    }

    /// Score an already-encoded feature vector.
    ///
    /// # Errors
    /// Same as [`InferenceService::predict`].
    pub fn score(&self, features: &FeatureVector) -> Result<PredictionResult, InferenceError> {
        let model = self.loaded_model()?;
        Self::score_with(model, features)
    }

    fn score_with(
        model: &ScoringModel,
        features: &FeatureVector,
    ) -> Result<PredictionResult, InferenceError> {
        let outcome = Self::run_model(model, features);

        match &outcome {
            Ok(result) => tracing::info!(
                prediction = result.prediction(),
                probability = ?result.probability(),
                risk = %result.risk_level(),
                "Inference complete"
            ),
            Err(e) => tracing::error!("Inference failed: {e}"),
        }

        outcome
    }

    fn run_model(
        model: &ScoringModel,
        features: &FeatureVector,
    ) -> Result<PredictionResult, InferenceError> {
        let label = model
            .predict(features)
            .map_err(|e| InferenceError::Prediction(e.to_string()))?;

        let positive = match label {
            POSITIVE_LABEL => true,
            NEGATIVE_LABEL => false,
            other => {
                return Err(InferenceError::Prediction(format!(
                    "model returned unexpected label {other}"
                )))
            }
        };

        let probability = match model {
            ScoringModel::LabelOnly(_) => None,
            ScoringModel::Probabilistic(m) => {
                Some(positive_class_probability(m.as_ref(), features)?)
            }
        };

        Ok(PredictionResult::new(positive, probability))
    }

    /// Metadata about the loaded model, or `None` when unloaded.
    #[must_use]
    pub fn model_info(&self) -> Option<ModelInfo> {
        let model = self.model.model()?;
        let descriptor = model.describe();

        Some(ModelInfo {
            model_type: descriptor.model_type,
            features: FEATURE_NAMES.to_vec(),
            has_probability: model.has_probability(),
            n_features: descriptor.n_features,
            has_feature_importance: descriptor.has_feature_importance.then_some(true),
        })
    }
}

/// Probability mass of the positive class.
///
/// The index is looked up in the model's declared class order instead of
/// assuming the positive class comes second.
fn positive_class_probability(
    model: &dyn ProbabilisticClassifier,
    features: &FeatureVector,
) -> Result<f64, InferenceError> {
    let proba = model
        .predict_proba(features)
        .map_err(|e| InferenceError::Prediction(e.to_string()))?;
    let classes = model.classes();

    if proba.len() != classes.len() {
        return Err(InferenceError::Prediction(format!(
            "probability output has {} entries for {} classes",
            proba.len(),
            classes.len()
        )));
    }

    let index = classes
        .iter()
        .position(|&c| c == POSITIVE_LABEL)
        .ok_or_else(|| {
            InferenceError::Prediction(format!(
                "model classes {classes:?} do not include label {POSITIVE_LABEL}"
            ))
        })?;

    let p = proba[index];
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(InferenceError::Prediction(format!(
            "probability {p} is outside [0, 1]"
        )));
    }
    Ok(p)
}
