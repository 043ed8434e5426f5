//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed values
    pub schema: ConfigSchema,
    /// File the values came from, if any
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, a standard location, or defaults
    ///
    /// An explicit path must exist. Standard locations are optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };
        schema.validate().map_err(|e| match &config_path {
            Some(p) => e.with_context(format!("In {}", p.display())),
            None => e,
        })?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }
}

/// Location of the per-user configuration file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("comercio-admin").join("config.toml"))
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = [".comercio-admin.toml", "comercio-admin.toml"];

    for candidate in candidates {
        let path = Path::new(candidate);
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorCode::ConfigError,
            format!("Failed to read config file {}: {e}", path.display()),
        )
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::from(e).with_context(format!("In {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_API_URL;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.schema.api.timeout_secs, 30);
        assert_eq!(config.schema.output.format, "text");
    }

    #[test]
    fn test_config_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://localhost:8000\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.schema.api.base_url, "http://localhost:8000");
        assert_eq!(config.schema.api.timeout_secs, 30);
        assert!(config.schema.session.path.is_none());
    }

    #[test]
    fn test_config_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ntimeout_secs = 0").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.context.is_some());
    }

    #[test]
    fn test_config_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url =").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.context.unwrap().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_session_path_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\npath = \"/tmp/comercio-session.json\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(
            config.schema.session.resolved_path(),
            PathBuf::from("/tmp/comercio-session.json")
        );
    }
}
