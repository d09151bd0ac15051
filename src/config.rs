use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::language_detect::CANONICAL_LANGUAGE;
use crate::pipeline::skills::{LlmBackendKind, LlmSettings};

/// Application-level constants
pub const APP_NAME: &str = "invoicebridge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

const ENV_BIND: &str = "INVOICEBRIDGE_BIND";
const ENV_LLM_BACKEND: &str = "INVOICEBRIDGE_LLM_BACKEND";
const ENV_LLM_URL: &str = "INVOICEBRIDGE_LLM_URL";
const ENV_LLM_MODEL: &str = "INVOICEBRIDGE_LLM_MODEL";
const ENV_LLM_TIMEOUT_SECS: &str = "INVOICEBRIDGE_LLM_TIMEOUT_SECS";
const ENV_REFERENCE_FILE: &str = "INVOICEBRIDGE_REFERENCE_FILE";
const ENV_TARGET_LANGUAGE: &str = "INVOICEBRIDGE_TARGET_LANGUAGE";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "invoicebridge_lib=info,invoicebridge=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidBindAddr { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    InvalidBackend { var: &'static str, reason: String },

    #[error("{var} must be a positive number of seconds, got {value}")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{0} is set but empty")]
    Empty(&'static str),
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub llm: LlmSettings,
    /// JSON file of reference records; built-in records when unset.
    pub reference_file: Option<PathBuf>,
    pub target_language: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(key) {
                None => Ok(None),
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
                Some(value) => Ok(Some(value.trim().to_string())),
            }
        };

        let bind_raw = get(ENV_BIND)?.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr {
                var: ENV_BIND,
                value: bind_raw.clone(),
            })?;

        let backend = match get(ENV_LLM_BACKEND)? {
            Some(raw) => raw
                .parse::<LlmBackendKind>()
                .map_err(|reason| ConfigError::InvalidBackend {
                    var: ENV_LLM_BACKEND,
                    reason,
                })?,
            None => LlmBackendKind::OpenAi,
        };

        let mut llm = LlmSettings::for_backend(backend);
        if let Some(url) = get(ENV_LLM_URL)? {
            llm.base_url = url;
        }
        if let Some(model) = get(ENV_LLM_MODEL)? {
            llm.model = model;
        }
        if let Some(raw) = get(ENV_LLM_TIMEOUT_SECS)? {
            llm.timeout_secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout {
                    var: ENV_LLM_TIMEOUT_SECS,
                    value: raw,
                })?;
        }

        Ok(Self {
            bind_addr,
            llm,
            reference_file: get(ENV_REFERENCE_FILE)?.map(PathBuf::from),
            target_language: get(ENV_TARGET_LANGUAGE)?
                .unwrap_or_else(|| CANONICAL_LANGUAGE.to_string()),
        })
    }
}
