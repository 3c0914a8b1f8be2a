//! Service configuration from environment variables.
//!
//! Every setting has a default, so the service starts with no environment
//! at all. Malformed values are rejected rather than silently replaced.

use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MODEL_PATH: &str = "model/heart_disease_svm_model.json";
pub const DEFAULT_LOG_FILE: &str = "cardiorisk.log";

const HOST_ENV: &str = "CARDIORISK_HOST";
const PORT_ENV: &str = "CARDIORISK_PORT";
const MODEL_PATH_ENV: &str = "CARDIORISK_MODEL_PATH";
const REQUIRE_SIGNED_MODEL_ENV: &str = "CARDIORISK_REQUIRE_SIGNED_MODEL";
const MODEL_PUBKEY_FILE_ENV: &str = "CARDIORISK_MODEL_PUBKEY_B64_FILE";
const LOG_MODE_ENV: &str = "CARDIORISK_LOG_MODE";
const LOG_FILE_ENV: &str = "CARDIORISK_LOG_FILE";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be one of true/false/1/0/yes/no, got {value:?}")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} must be \"stdout\" or \"file\", got {value:?}")]
    InvalidLogMode { var: &'static str, value: String },
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stdout,
    File,
}

/// Runtime settings for the prediction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Location of the model artifact
    pub model_path: PathBuf,
    /// Refuse artifacts without a valid signed manifest
    pub require_signed_model: bool,
    /// File holding the base64 Ed25519 verifying key for the manifest
    pub model_pubkey_file: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            require_signed_model: false,
            model_pubkey_file: None,
            log_mode: LogMode::Stdout,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV).filter(|v| !v.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        if let Some(port) = lookup(PORT_ENV) {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidPort {
                var: PORT_ENV,
                value: port.clone(),
            })?;
        }

        if let Some(path) = lookup(MODEL_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            config.model_path = PathBuf::from(path.trim());
        }

        if let Some(v) = lookup(REQUIRE_SIGNED_MODEL_ENV) {
            config.require_signed_model = parse_bool(REQUIRE_SIGNED_MODEL_ENV, &v)?;
        }

        config.model_pubkey_file = lookup(MODEL_PUBKEY_FILE_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(v.trim()));

        if let Some(mode) = lookup(LOG_MODE_ENV) {
            config.log_mode = match mode.trim().to_ascii_lowercase().as_str() {
                "stdout" | "" => LogMode::Stdout,
                "file" => LogMode::File,
                _ => {
                    return Err(ConfigError::InvalidLogMode {
                        var: LOG_MODE_ENV,
                        value: mode,
                    })
                }
            };
        }

        if let Some(path) = lookup(LOG_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.log_file = PathBuf::from(path.trim());
        }

        Ok(config)
    }

    /// Get the bind address
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
