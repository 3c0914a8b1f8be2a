//! Test doubles shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::FeatureVector;
use crate::ports::{ModelDescriptor, ModelError, ProbabilisticClassifier, RiskClassifier};

/// The reference patient used across tests.
pub fn sample_record_json() -> Value {
    json!({
        "age": 55, "sex": 1, "cp": 2, "trestbps": 130, "chol": 250, "fbs": 1,
        "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 2,
        "ca": 0, "thal": 3
    })
}

fn descriptor(model_type: &str) -> ModelDescriptor {
    ModelDescriptor {
        model_type: model_type.to_string(),
        n_features: None,
        has_feature_importance: false,
    }
}

/// Returns a fixed label and counts how often it was asked.
pub struct FixedLabelModel {
    label: i64,
    calls: Arc<AtomicUsize>,
}

impl FixedLabelModel {
    pub fn new(label: i64) -> Self {
        Self {
            label,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl RiskClassifier for FixedLabelModel {
    fn predict(&self, _features: &FeatureVector) -> Result<i64, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.label)
    }

    fn describe(&self) -> ModelDescriptor {
        descriptor("FixedLabelModel")
    }
}

/// Returns a fixed label and a fixed probability vector.
pub struct FixedProbaModel {
    pub label: i64,
    pub proba: Vec<f64>,
    pub classes: Vec<i64>,
}

impl FixedProbaModel {
    pub fn new(label: i64, proba: Vec<f64>) -> Self {
        Self {
            label,
            proba,
            classes: vec![0, 1],
        }
    }
}

impl RiskClassifier for FixedProbaModel {
    fn predict(&self, _features: &FeatureVector) -> Result<i64, ModelError> {
        Ok(self.label)
    }

    fn describe(&self) -> ModelDescriptor {
        ModelDescriptor {
            n_features: Some(13),
            has_feature_importance: true,
            ..descriptor("FixedProbaModel")
        }
    }
}

impl ProbabilisticClassifier for FixedProbaModel {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        Ok(self.proba.clone())
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }
}

/// Always fails to score.
pub struct FailingModel;

impl RiskClassifier for FailingModel {
    fn predict(&self, _features: &FeatureVector) -> Result<i64, ModelError> {
        Err(ModelError::Scoring(
            "X has 12 features, but the model is expecting 13 features".to_string(),
        ))
    }

    fn describe(&self) -> ModelDescriptor {
        descriptor("FailingModel")
    }
}
