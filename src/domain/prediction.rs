//! Prediction result types.
//!
//! Represents the response derived from the classifier's raw output.

use serde::{Deserialize, Serialize};

/// Label for "heart disease present".
pub const POSITIVE_LABEL: i64 = 1;

/// Label for "no heart disease".
pub const NEGATIVE_LABEL: i64 = 0;

pub const HIGH_RISK_MESSAGE: &str = "The model predicts a high risk of heart disease. Please consult a healthcare professional for proper medical evaluation.";

pub const LOW_RISK_MESSAGE: &str = "The model predicts a low risk of heart disease. However, regular check-ups are still recommended.";

/// Binary risk classification for heart disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    #[must_use]
    pub fn from_positive(positive: bool) -> Self {
        if positive {
            Self::High
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::High => "High Risk",
        }
    }

    /// Fixed advice shown to the caller.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Low => LOW_RISK_MESSAGE,
            Self::High => HIGH_RISK_MESSAGE,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    prediction: u8,
    probability: Option<f64>,
    risk_level: RiskLevel,
    message: String,
}

impl PredictionResult {
    /// Derive the response fields from a binary prediction.
    ///
    /// `probability` is the mass assigned to the positive class, when the
    /// model reports one.
    #[must_use]
    pub fn new(positive: bool, probability: Option<f64>) -> Self {
        let risk_level = RiskLevel::from_positive(positive);
        Self {
            prediction: u8::from(positive),
            probability,
            risk_level,
            message: risk_level.message().to_string(),
        }
    }

    /// 0 (no disease) or 1 (disease present)
    #[must_use]
    pub fn prediction(&self) -> u8 {
        self.prediction
    }

    #[must_use]
    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
