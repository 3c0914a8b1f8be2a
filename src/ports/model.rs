//! Model port: Traits for the pre-trained risk classifier.
//!
//! The classifier is opaque to the application. Whether it can report class
//! probabilities is decided once, when the artifact is loaded, by wrapping it
//! in the matching [`ScoringModel`] variant.

use std::fmt;
use std::sync::Arc;

use crate::domain::FeatureVector;

/// Errors raised by a classifier while scoring.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model produced a non-finite score")]
    NonFinite,

    #[error("{0}")]
    Scoring(String),
}

/// Static facts a classifier reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Algorithm name (e.g. "SVC")
    pub model_type: String,
    /// Number of input features, if the model records it
    pub n_features: Option<usize>,
    /// Whether per-feature importances are available
    pub has_feature_importance: bool,
}

/// A binary classifier producing a label per record.
pub trait RiskClassifier: Send + Sync {
    /// Predict the class label for one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError` if scoring fails.
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError>;

    fn describe(&self) -> ModelDescriptor;
}

/// A classifier that also reports class probabilities.
pub trait ProbabilisticClassifier: RiskClassifier {
    /// Class probabilities, ordered like [`ProbabilisticClassifier::classes`].
    ///
    /// # Errors
    /// Returns `ModelError` if scoring fails.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError>;

    /// Class labels in the order used by `predict_proba`.
    fn classes(&self) -> &[i64];
}

/// A loaded classifier, tagged with its capabilities.
#[derive(Clone)]
pub enum ScoringModel {
    LabelOnly(Arc<dyn RiskClassifier>),
    Probabilistic(Arc<dyn ProbabilisticClassifier>),
}

impl ScoringModel {
    pub fn label_only(model: impl RiskClassifier + 'static) -> Self {
        Self::LabelOnly(Arc::new(model))
    }

    pub fn probabilistic(model: impl ProbabilisticClassifier + 'static) -> Self {
        Self::Probabilistic(Arc::new(model))
    }

    #[must_use]
    pub fn has_probability(&self) -> bool {
        matches!(self, Self::Probabilistic(_))
    }

    /// Predict the class label, whatever the variant.
    ///
    /// # Errors
    /// Returns `ModelError` if scoring fails.
    pub fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        match self {
            Self::LabelOnly(m) => m.predict(features),
            Self::Probabilistic(m) => m.predict(features),
        }
    }

    #[must_use]
    pub fn describe(&self) -> ModelDescriptor {
        match self {
            Self::LabelOnly(m) => m.describe(),
            Self::Probabilistic(m) => m.describe(),
        }
    }
}

impl fmt::Debug for ScoringModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::LabelOnly(_) => "LabelOnly",
            Self::Probabilistic(_) => "Probabilistic",
        };
        f.debug_struct("ScoringModel")
            .field("variant", &variant)
            .field("model_type", &self.describe().model_type)
            .finish()
    }
}

/// Lifecycle of the process-wide model.
///
/// Set once at startup from the artifact load outcome and never changed.
#[derive(Debug, Clone, Default)]
pub enum ModelState {
    #[default]
    Unloaded,
    Loaded(ScoringModel),
}

impl ModelState {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    #[must_use]
    pub fn model(&self) -> Option<&ScoringModel> {
        match self {
            Self::Loaded(m) => Some(m),
            Self::Unloaded => None,
        }
    }
}

impl From<ScoringModel> for ModelState {
    fn from(model: ScoringModel) -> Self {
        Self::Loaded(model)
    }
}
