//! Local errors of the admin tools
//!
//! Failures that happen before or around a backend call: configuration,
//! the stored session, the route guard and form input. Each one carries a
//! numeric code, an optional context line and a hint for the user.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes, grouped by thousands into a [`Category`]
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Internal = 1001,

    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    ConfigValidationError = 3003,

    NotAuthenticated = 4001,
    SessionCorrupt = 4002,
    AccessRestricted = 4003,

    ValidationError = 6000,
    InvalidFormat = 6002,
}

/// What part of a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// A bug or a poisoned lock
    General,
    /// Reading or writing local files
    Io,
    /// The configuration file
    Configuration,
    /// The stored login or the route guard
    Session,
    /// Form input
    Validation,
}

impl Category {
    /// Process exit code for errors of this category
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Validation => exit_codes::VALIDATION_ERROR,
            Self::Configuration => exit_codes::CONFIG_ERROR,
            Self::Session => exit_codes::SESSION_ERROR,
            Self::General | Self::Io => exit_codes::FAILURE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ErrorCode {
    /// Numeric value, as shown in `E4001`
    #[must_use]
    pub fn number(self) -> u32 {
        self as u32
    }

    /// Group the code belongs to
    #[must_use]
    pub fn category(self) -> Category {
        match self.number() / 1000 {
            2 => Category::Io,
            3 => Category::Configuration,
            4 => Category::Session,
            6 => Category::Validation,
            _ => Category::General,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.number())
    }
}

/// An error with a code, and optionally where it happened and what to try next
#[derive(Error, Debug)]
pub struct Error {
    /// What went wrong, in machine form
    pub code: ErrorCode,
    /// Shown to the user as is
    pub message: String,
    /// Where it happened, e.g. the config file path
    pub context: Option<String>,
    /// What the user can do about it
    pub suggestion: Option<String>,
    /// Underlying error, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

#[allow(missing_docs)]
impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.category().exit_code()
    }

    /// Serializable form, used for `--format json` errors
    #[must_use]
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(ToString::to_string),
        }
    }

    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .comercio-admin.toml file or drop --config to use defaults")
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated, "No active session")
            .with_suggestion("Run `comercio-admin login` first")
    }

    pub fn access_restricted(path: &str) -> Self {
        Self::new(
            ErrorCode::AccessRestricted,
            format!("Your roles do not allow access to {path}"),
        )
        .with_suggestion("Ask an administrator to review your roles")
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }
}

/// What `--format json` prints under `error.detail`
#[allow(missing_docs)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub code_str: String,
    pub category: Category,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result with the local [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes of `comercio-admin`
#[allow(missing_docs)]
pub mod exit_codes {
    pub const FAILURE: i32 = 1;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const SESSION_ERROR: i32 = 4;
    /// Network failures and backend errors
    pub const REMOTE_ERROR: i32 = 5;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::InvalidFormat, format!("Invalid JSON: {err}")).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("Invalid TOML: {err}")).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::NotAuthenticated.to_string(), "E4001");
    }

    #[test]
    fn test_category_exit_codes() {
        assert_eq!(ErrorCode::SessionCorrupt.category(), Category::Session);
        assert_eq!(Error::not_authenticated().exit_code(), 4);
        assert_eq!(Error::config_not_found("x.toml").exit_code(), 3);
        assert_eq!(Error::invalid_format("bad").exit_code(), 2);
        assert_eq!(Error::new(ErrorCode::Internal, "lock").exit_code(), 1);
        assert_eq!(ErrorCode::PermissionDenied.category().exit_code(), 1);
    }

    #[test]
    fn test_display_adds_context() {
        let err = Error::not_authenticated().with_context("listing feiras");
        assert_eq!(err.to_string(), "No active session (listing feiras)");
        assert!(err.suggestion.unwrap().contains("login"));
    }

    #[test]
    fn test_report_serialization() {
        let report = Error::access_restricted("/bairros").to_report();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["code"], "ACCESS_RESTRICTED");
        assert_eq!(json["code_str"], "E4003");
        assert_eq!(json["category"], "Session");
        assert!(json.get("context").is_none());
    }

    #[test]
    fn test_toml_error_keeps_source() {
        let err: Error = toml::from_str::<toml::Value>("[api\n").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert_eq!(err.exit_code(), 3);
        assert!(err.source.is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.source.is_some());
    }
}
