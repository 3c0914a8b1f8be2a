//! Linear classifier exported as JSON.
//!
//! Covers linear SVMs and logistic regression: an optional standard scaler,
//! one weight per feature and an intercept. SVMs trained with probability
//! estimates carry Platt scaling parameters; logistic models use the plain
//! sigmoid of the decision value.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES, NEGATIVE_LABEL, POSITIVE_LABEL};
use crate::ports::{ModelDescriptor, ModelError, ProbabilisticClassifier, RiskClassifier};

use super::ModelLoadError;

/// Standard scaler parameters: `x' = (x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Mapping from decision value to positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbabilityCalibration {
    /// `p = 1 / (1 + exp(-z))`
    Logistic,
    /// `p = 1 / (1 + exp(a * z + b))`
    Platt { a: f64, b: f64 },
}

impl ProbabilityCalibration {
    fn positive_probability(self, z: f64) -> f64 {
        match self {
            Self::Logistic => sigmoid(z),
            Self::Platt { a, b } => sigmoid(-(a * z + b)),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn default_classes() -> Vec<i64> {
    vec![NEGATIVE_LABEL, POSITIVE_LABEL]
}

/// On-disk model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub model_type: String,
    pub feature_names: Vec<String>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    #[serde(default)]
    pub probability: Option<ProbabilityCalibration>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

fn fixed_len(name: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT], ModelLoadError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelLoadError::Invalid(format!(
            "{name} contains non-finite values"
        )));
    }
    <[f64; FEATURE_COUNT]>::try_from(values).map_err(|_| {
        ModelLoadError::Invalid(format!(
            "{name} has {} entries, expected {FEATURE_COUNT}",
            values.len()
        ))
    })
}

/// A validated linear classifier, ready to score.
#[derive(Debug, Clone)]
pub struct LinearModel {
    model_type: String,
    classes: [i64; 2],
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
    calibration: Option<ProbabilityCalibration>,
    has_feature_importance: bool,
}

impl LinearModel {
    /// Check an artifact against the feature contract and build the model.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Invalid` if the feature order differs from
    /// `FEATURE_NAMES`, a vector has the wrong length, a value is not
    /// finite, a scale is zero, or the classes are not two distinct labels.
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, ModelLoadError> {
        if artifact.feature_names != FEATURE_NAMES {
            return Err(ModelLoadError::Invalid(format!(
                "feature order mismatch: expected {FEATURE_NAMES:?}, got {:?}",
                artifact.feature_names
            )));
        }

        let classes = <[i64; 2]>::try_from(artifact.classes.as_slice())
            .ok()
            .filter(|c| c[0] != c[1])
            .ok_or_else(|| {
                ModelLoadError::Invalid(format!(
                    "classes must be two distinct labels, got {:?}",
                    artifact.classes
                ))
            })?;

        let weights = fixed_len("coefficients", &artifact.coefficients)?;
        if !artifact.intercept.is_finite() {
            return Err(ModelLoadError::Invalid("intercept is not finite".into()));
        }

        let (mean, scale) = match &artifact.scaler {
            Some(scaler) => {
                let mean = fixed_len("scaler.mean", &scaler.mean)?;
                let scale = fixed_len("scaler.scale", &scaler.scale)?;
                if let Some(i) = scale.iter().position(|s| *s == 0.0) {
                    return Err(ModelLoadError::Invalid(format!(
                        "scaler.scale for {} is zero",
                        FEATURE_NAMES[i]
                    )));
                }
                (mean, scale)
            }
            None => ([0.0; FEATURE_COUNT], [1.0; FEATURE_COUNT]),
        };

        if let Some(ProbabilityCalibration::Platt { a, b }) = artifact.probability {
            if !a.is_finite() || !b.is_finite() {
                return Err(ModelLoadError::Invalid(
                    "Platt parameters must be finite".into(),
                ));
            }
        }

        let has_feature_importance = match &artifact.feature_importances {
            Some(importances) => {
                fixed_len("feature_importances", importances)?;
                true
            }
            None => false,
        };

        Ok(Self {
            model_type: artifact.model_type,
            classes,
            weights,
            intercept: artifact.intercept,
            mean,
            scale,
            calibration: artifact.probability,
            has_feature_importance,
        })
    }

    #[must_use]
    pub fn has_probability(&self) -> bool {
        self.calibration.is_some()
    }

    /// Signed distance from the separating hyperplane.
    fn decision_function(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let z = features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .zip(self.weights.iter())
            .map(|((x, (mean, scale)), w)| w * (x - mean) / scale)
            .sum::<f64>()
            + self.intercept;

        if z.is_finite() {
            Ok(z)
        } else {
            Err(ModelError::NonFinite)
        }
    }
}

impl RiskClassifier for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        let z = self.decision_function(features)?;
        Ok(if z > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        })
    }

    fn describe(&self) -> ModelDescriptor {
        ModelDescriptor {
            model_type: self.model_type.clone(),
            n_features: Some(FEATURE_COUNT),
            has_feature_importance: self.has_feature_importance,
        }
    }
}

impl ProbabilisticClassifier for LinearModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let calibration = self.calibration.ok_or_else(|| {
            ModelError::Scoring("model was exported without probability estimates".into())
        })?;
        let p = calibration.positive_probability(self.decision_function(features)?);
        Ok(vec![1.0 - p, p])
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }
}
