//! Model artifact loading.
//!
//! Reads the exported classifier from disk, checks it against its manifest
//! (and signature, when a verifying key is configured) and hands back a
//! `ScoringModel` whose capability is fixed at load time.

mod linear;
mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

pub use linear::{LinearModel, LinearModelArtifact, ProbabilityCalibration, Scaler};
pub use manifest::{
    sha256_hex, verify_artifact, verifying_key_from_b64, ModelManifest, Verification,
    VerificationPolicy, MANIFEST_FILE, SIGNATURE_FILE,
};

use crate::config::ServiceConfig;
use crate::ports::{ModelState, ScoringModel};

/// Errors raised while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),

    #[error("Unsigned model refused: {0}")]
    Unsigned(String),
}

/// Load and verify the artifact at `path`.
///
/// # Errors
/// Returns `ModelLoadError` if the file is missing, fails verification,
/// or does not describe a classifier over the 13 clinical features.
pub fn load_model(path: &Path, policy: &VerificationPolicy) -> Result<ScoringModel, ModelLoadError> {
    let bytes = fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let verification = verify_artifact(path, &bytes, policy)?;

    let artifact: LinearModelArtifact = serde_json::from_slice(&bytes)?;
    let model = LinearModel::from_artifact(artifact)?;

    tracing::info!(
        path = ?path,
        verification = ?verification,
        probability = model.has_probability(),
        "Model loaded successfully"
    );

    Ok(if model.has_probability() {
        ScoringModel::probabilistic(model)
    } else {
        ScoringModel::label_only(model)
    })
}

/// Load the configured model, falling back to `Unloaded` on any failure.
///
/// The service stays up without a model; predictions then report the
/// model as unavailable.
#[must_use]
pub fn load_model_state(config: &ServiceConfig) -> ModelState {
    let policy = match VerificationPolicy::from_key_file(
        config.require_signed_model,
        config.model_pubkey_file.as_deref(),
    ) {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!("Error loading model: {}", e);
            return ModelState::Unloaded;
        }
    };

    match load_model(&config.model_path, &policy) {
        Ok(model) => ModelState::Loaded(model),
        Err(e) => {
            tracing::error!("Error loading model: {}", e);
            ModelState::Unloaded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
    use tempfile::tempdir;

    fn artifact_json(probability: Option<&str>) -> String {
        let names = serde_json::to_string(&FEATURE_NAMES).expect("names");
        let coef = serde_json::to_string(&vec![0.1; FEATURE_COUNT]).expect("coef");
        let probability = probability
            .map(|p| format!(r#", "probability": {p}"#))
            .unwrap_or_default();
        format!(
            r#"{{"model_type": "SVC", "feature_names": {names}, "coefficients": {coef}, "intercept": -1.0{probability}}}"#
        )
    }

    #[test]
    fn test_load_probabilistic_model() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("model.json");
        fs::write(&path, artifact_json(Some(r#"{"kind": "logistic"}"#))).expect("write");

        let model = load_model(&path, &VerificationPolicy::default()).expect("Should load");
        assert!(model.has_probability());
        assert_eq!(model.describe().model_type, "SVC");
    }

    #[test]
    fn test_load_label_only_model() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("model.json");
        fs::write(&path, artifact_json(None)).expect("write");

        let model = load_model(&path, &VerificationPolicy::default()).expect("Should load");
        assert!(!model.has_probability());
        let label = model
            .predict(&FeatureVector::new([0.0; FEATURE_COUNT]))
            .expect("predict");
        assert_eq!(label, 0);
    }

    #[test]
    fn test_load_errors() {
        let temp = tempdir().expect("tempdir");

        let missing = temp.path().join("absent.json");
        let err = load_model(&missing, &VerificationPolicy::default()).expect_err("missing");
        assert!(matches!(err, ModelLoadError::Io { .. }));

        let garbage = temp.path().join("garbage.json");
        fs::write(&garbage, "not json").expect("write");
        let err = load_model(&garbage, &VerificationPolicy::default()).expect_err("garbage");
        assert!(matches!(err, ModelLoadError::Parse(_)));
    }

    #[test]
    fn test_tampered_artifact_is_refused() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("model.json");
        let json = artifact_json(None);
        fs::write(&path, &json).expect("write");

        let mut files = std::collections::BTreeMap::new();
        files.insert("model.json".to_string(), sha256_hex(json.as_bytes()));
        let manifest = serde_json::to_vec(&ModelManifest::new(files)).expect("manifest");
        fs::write(temp.path().join(MANIFEST_FILE), manifest).expect("write manifest");

        assert!(load_model(&path, &VerificationPolicy::default()).is_ok());

        fs::write(&path, json.replace("-1.0", "5.0")).expect("tamper");
        let err = load_model(&path, &VerificationPolicy::default()).expect_err("tampered");
        assert!(matches!(err, ModelLoadError::Integrity(_)));
    }

    #[test]
    fn test_load_model_state_falls_back_to_unloaded() {
        let temp = tempdir().expect("tempdir");
        let config = ServiceConfig {
            model_path: temp.path().join("absent.json"),
            ..ServiceConfig::default()
        };
        assert!(!load_model_state(&config).is_loaded());

        let path = temp.path().join("model.json");
        fs::write(&path, artifact_json(None)).expect("write");
        let config = ServiceConfig {
            model_path: path,
            require_signed_model: true,
            ..ServiceConfig::default()
        };
        assert!(!load_model_state(&config).is_loaded());
    }

    #[test]
    fn test_bundled_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(crate::config::DEFAULT_MODEL_PATH);
        let model = load_model(&path, &VerificationPolicy::default()).expect("Should load");
        assert!(model.has_probability());
        assert_eq!(model.describe().n_features, Some(FEATURE_COUNT));
    }
}
