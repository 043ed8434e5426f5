//! Configuration schema definitions

use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default backend host
pub const DEFAULT_API_URL: &str = "https://comercioassim.ufape.edu.br";

/// Default postal-code lookup service
pub const DEFAULT_CEP_URL: &str = "https://viacep.com.br/ws";

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl ConfigSchema {
    /// Validate the loaded values
    pub fn validate(&self) -> Result<()> {
        for (field, url) in [("api.base_url", &self.api.base_url), ("api.cep_url", &self.api.cep_url)] {
            if url.trim().is_empty() {
                return Err(Error::new(
                    ErrorCode::ConfigValidationError,
                    format!("{field} cannot be empty"),
                ));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::new(
                    ErrorCode::ConfigValidationError,
                    format!("{field} must start with http:// or https://"),
                ));
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::new(
                ErrorCode::ConfigValidationError,
                "api.timeout_secs cannot be zero",
            ));
        }

        if !["text", "json"].contains(&self.output.format.as_str()) {
            return Err(Error::new(
                ErrorCode::ConfigValidationError,
                format!("output.format must be text or json, got {}", self.output.format),
            ));
        }

        Ok(())
    }
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the postal-code lookup service
    #[serde(default = "default_cep_url")]
    pub cep_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cep_url: default_cep_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_cep_url() -> String {
    DEFAULT_CEP_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Explicit session file; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    /// Resolve the session file location
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from(".comercio"))
                .join("comercio-admin")
                .join("session.json")
        })
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `text` or `json`
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "text".to_string()
}
