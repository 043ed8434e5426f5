//! Configuration for the Comércio API client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use comercio_core::config::{ConfigSchema, DEFAULT_API_URL, DEFAULT_CEP_URL};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (typically `php artisan serve`)
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse from environment variable
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("COMERCIO_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API (paths start with `/api/...`)
    pub base_url: String,
    /// Base URL of the postal-code lookup service
    pub cep_url: String,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Current environment
    pub environment: Environment,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("comercio-admin/{}", env!("CARGO_PKG_VERSION"))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            cep_url: DEFAULT_CEP_URL.to_string(),
            timeout: Duration::from_secs(30),
            environment: Environment::default(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `COMERCIO_API_URL`: Base URL of the REST API
    /// - `COMERCIO_CEP_URL`: Base URL of the postal-code lookup
    /// - `COMERCIO_ENV`: Environment (development/staging/production)
    /// - `COMERCIO_TIMEOUT_SECS`: Request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        Self::default().merge_env()
    }

    /// Start from a loaded configuration file, then apply environment overrides
    pub fn from_schema(schema: &ConfigSchema) -> ApiResult<Self> {
        Self {
            base_url: schema.api.base_url.clone(),
            cep_url: schema.api.cep_url.clone(),
            timeout: Duration::from_secs(schema.api.timeout_secs),
            environment: Environment::default(),
            user_agent: default_user_agent(),
        }
        .merge_env()
    }

    fn merge_env(mut self) -> ApiResult<Self> {
        self.environment = Environment::from_env();

        if let Ok(url) = env::var("COMERCIO_API_URL") {
            self.base_url = url;
        } else if self.environment == Environment::Development
            && self.base_url == DEFAULT_API_URL
        {
            self.base_url = "http://localhost:8000".to_string();
        }

        if let Ok(url) = env::var("COMERCIO_CEP_URL") {
            self.cep_url = url;
        }

        if let Ok(raw) = env::var("COMERCIO_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ApiError::config(format!("COMERCIO_TIMEOUT_SECS is not a number: {raw}")))?;
            self.timeout = Duration::from_secs(secs);
        }

        Ok(self)
    }

    /// Create development configuration (local backend)
    #[must_use]
    pub fn development() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            cep_url: DEFAULT_CEP_URL.to_string(),
            timeout: Duration::from_secs(10),
            environment: Environment::Development,
            user_agent: default_user_agent(),
        }
    }

    /// Create production configuration
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the postal-code lookup URL
    #[must_use]
    pub fn with_cep_url(mut self, url: impl Into<String>) -> Self {
        self.cep_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        for (name, url) in [("base_url", &self.base_url), ("cep_url", &self.cep_url)] {
            if url.is_empty() {
                return Err(ApiError::config(format!("{name} cannot be empty")));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ApiError::config(format!(
                    "{name} must start with http:// or https://"
                )));
            }
        }

        if self.user_agent.trim().is_empty() {
            return Err(ApiError::config("user_agent cannot be empty"));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://comercioassim.ufape.edu.br");
        assert!(config.cep_url.contains("viacep"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_development_config() {
        let config = ClientConfig::development();
        assert!(config.base_url.contains("localhost"));
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_from_schema() {
        let mut schema = ConfigSchema::default();
        schema.api.timeout_secs = 5;
        let config = ClientConfig::from_schema(&schema).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:9000")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(ClientConfig::default().with_cep_url("viacep.com.br").validate().is_err());
        assert!(ClientConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
