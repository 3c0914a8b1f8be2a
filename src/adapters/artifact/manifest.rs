//! Model manifest: SHA-256 digests of artifact files, optionally signed.
//!
//! # Layout
//!
//! ```text
//! model/
//!   heart_disease_svm_model.json   the artifact
//!   manifest.json                  {"version":1,"created_at":..,"files":{name: sha256}}
//!   model.sig                      64-byte Ed25519 signature over manifest.json
//! ```
//!
//! The signature covers the manifest bytes exactly as stored, and the
//! manifest binds the artifact by digest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ModelLoadError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";
pub const MANIFEST_VERSION: u32 = 1;

/// Clock skew tolerated for manifests stamped in the future.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Digest manifest for the files of one model directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was created.
    pub created_at: i64,
    /// File name relative to the manifest directory → lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    #[must_use]
    pub fn new(files: BTreeMap<String, String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            created_at: unix_now(),
            files,
        }
    }
}

/// How strongly the loaded artifact was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No manifest present
    Unverified,
    /// Digest matched an unsigned manifest
    Digest,
    /// Digest matched a manifest with a valid signature
    Signed,
}

/// Rules applied before an artifact is trusted.
#[derive(Debug, Clone, Default)]
pub struct VerificationPolicy {
    pub require_signature: bool,
    pub verifying_key: Option<VerifyingKey>,
}

impl VerificationPolicy {
    /// Build a policy, reading the verifying key from `key_file` if given.
    ///
    /// # Errors
    /// Returns `ModelLoadError` if the key file is unreadable or malformed.
    pub fn from_key_file(
        require_signature: bool,
        key_file: Option<&Path>,
    ) -> Result<Self, ModelLoadError> {
        let verifying_key = match key_file {
            Some(path) => {
                let b64 = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Some(verifying_key_from_b64(&b64)?)
            }
            None => None,
        };

        Ok(Self {
            require_signature,
            verifying_key,
        })
    }
}

pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a base64 Ed25519 verifying key (32 bytes).
///
/// # Errors
/// Returns `ModelLoadError::Integrity` on bad base64, length or point.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ModelLoadError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ModelLoadError::Integrity("invalid verifying key base64".into()))?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ModelLoadError::Integrity(format!(
            "verifying key must be 32 bytes, got {}",
            bytes.len()
        ))
    })?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ModelLoadError::Integrity("invalid verifying key".into()))
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |diff, (x, y)| diff | (x ^ y))
        == 0
}

fn read(path: &Path) -> Result<Vec<u8>, ModelLoadError> {
    fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn model_dir(artifact_path: &Path) -> PathBuf {
    match artifact_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check `artifact_bytes` (read from `artifact_path`) against its manifest.
///
/// # Errors
/// Returns `ModelLoadError::Unsigned` when the policy demands a signature
/// that cannot be checked, and `ModelLoadError::Integrity` when a signature
/// or digest does not match.
pub fn verify_artifact(
    artifact_path: &Path,
    artifact_bytes: &[u8],
    policy: &VerificationPolicy,
) -> Result<Verification, ModelLoadError> {
    let dir = model_dir(artifact_path);
    let manifest_path = dir.join(MANIFEST_FILE);

    if !manifest_path.exists() {
        if policy.require_signature {
            return Err(ModelLoadError::Unsigned(format!(
                "{manifest_path:?} not found"
            )));
        }
        tracing::warn!(
            "No manifest next to {:?}; loading unverified model",
            artifact_path
        );
        return Ok(Verification::Unverified);
    }

    let manifest_bytes = read(&manifest_path)?;

    let signed = match &policy.verifying_key {
        Some(key) => {
            let sig_path = dir.join(SIGNATURE_FILE);
            if !sig_path.exists() {
                return Err(ModelLoadError::Unsigned(format!("{sig_path:?} not found")));
            }
            let sig_bytes: [u8; 64] = read(&sig_path)?.as_slice().try_into().map_err(|_| {
                ModelLoadError::Integrity("invalid signature length (expected 64 bytes)".into())
            })?;
            key.verify(&manifest_bytes, &Signature::from_bytes(&sig_bytes))
                .map_err(|_| ModelLoadError::Integrity("invalid manifest signature".into()))?;
            true
        }
        None if policy.require_signature => {
            return Err(ModelLoadError::Unsigned(
                "no verifying key configured".into(),
            ));
        }
        None => false,
    };

    let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ModelLoadError::Integrity(format!("invalid {MANIFEST_FILE}: {e}")))?;

    if manifest.version != MANIFEST_VERSION {
        return Err(ModelLoadError::Integrity(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }
    if manifest.created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
        return Err(ModelLoadError::Integrity(
            "manifest created_at is in the future".into(),
        ));
    }

    let file_name = artifact_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ModelLoadError::Integrity(format!("bad artifact path {artifact_path:?}")))?;
    let expected = manifest.files.get(file_name).ok_or_else(|| {
        ModelLoadError::Integrity(format!("manifest does not bind {file_name}"))
    })?;

    if !constant_time_eq_str(&sha256_hex(artifact_bytes), expected) {
        return Err(ModelLoadError::Integrity(format!(
            "hash mismatch for {file_name}"
        )));
    }

    Ok(if signed {
        Verification::Signed
    } else {
        Verification::Digest
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    const ARTIFACT: &str = "model.json";

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn write_manifest(dir: &Path, files: &[(&str, &[u8])]) -> Vec<u8> {
        let files = files
            .iter()
            .map(|(name, bytes)| ((*name).to_string(), sha256_hex(bytes)))
            .collect();
        let bytes = serde_json::to_vec(&ModelManifest::new(files)).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        bytes
    }

    fn sign(dir: &Path, key: &SigningKey, manifest: &[u8]) {
        let signature: Signature = key.sign(manifest);
        fs::write(dir.join(SIGNATURE_FILE), signature.to_bytes()).expect("write signature");
    }

    fn signed_policy(key: &SigningKey) -> VerificationPolicy {
        VerificationPolicy {
            require_signature: true,
            verifying_key: Some(key.verifying_key()),
        }
    }

    #[test]
    fn test_no_manifest_is_unverified_unless_required() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(ARTIFACT);

        let outcome = verify_artifact(&path, b"{}", &VerificationPolicy::default())
            .expect("Should allow");
        assert_eq!(outcome, Verification::Unverified);

        let policy = VerificationPolicy {
            require_signature: true,
            verifying_key: None,
        };
        let err = verify_artifact(&path, b"{}", &policy).expect_err("Should refuse");
        assert!(matches!(err, ModelLoadError::Unsigned(_)));
    }

    #[test]
    fn test_digest_only_manifest() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(ARTIFACT);
        write_manifest(temp.path(), &[(ARTIFACT, b"artifact")]);

        let outcome = verify_artifact(&path, b"artifact", &VerificationPolicy::default())
            .expect("Should verify");
        assert_eq!(outcome, Verification::Digest);

        let err = verify_artifact(&path, b"tampered", &VerificationPolicy::default())
            .expect_err("Should reject");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_signed_manifest() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(ARTIFACT);
        let key = signing_key();
        let manifest = write_manifest(temp.path(), &[(ARTIFACT, b"artifact")]);
        sign(temp.path(), &key, &manifest);

        let outcome =
            verify_artifact(&path, b"artifact", &signed_policy(&key)).expect("Should verify");
        assert_eq!(outcome, Verification::Signed);
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(ARTIFACT);
        let manifest = write_manifest(temp.path(), &[(ARTIFACT, b"artifact")]);
        sign(temp.path(), &signing_key(), &manifest);

        let err = verify_artifact(&path, b"artifact", &signed_policy(&signing_key()))
            .expect_err("Should reject");
        assert!(err.to_string().contains("invalid manifest signature"));
    }

    #[test]
    fn test_missing_signature_is_rejected_when_key_configured() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(ARTIFACT);
        write_manifest(temp.path(), &[(ARTIFACT, b"artifact")]);

        let err = verify_artifact(&path, b"artifact", &signed_policy(&signing_key()))
            .expect_err("Should reject");
        assert!(matches!(err, ModelLoadError::Unsigned(_)));
    }

    #[test]
    fn test_manifest_must_bind_artifact() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(ARTIFACT);
        write_manifest(temp.path(), &[("other.json", b"artifact")]);

        let err = verify_artifact(&path, b"artifact", &VerificationPolicy::default())
            .expect_err("Should reject");
        assert!(err.to_string().contains("does not bind"));
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key().verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        assert_eq!(verifying_key_from_b64(&format!("{b64}\n")).expect("decode"), key);
        assert!(verifying_key_from_b64("not base64!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }

    #[test]
    fn test_constant_time_eq_str() {
        assert!(constant_time_eq_str("abcd", "abcd"));
        assert!(!constant_time_eq_str("abcd", "abce"));
        assert!(!constant_time_eq_str("abc", "abcd"));
    }
}
