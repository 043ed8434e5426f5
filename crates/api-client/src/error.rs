//! Error types for the API client

use comercio_core::validation::ValidationError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Submission refused before the record reached the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// E-mail missing or malformed
    InvalidEmail,
    /// CPF checksum failed
    InvalidCpf,
    /// CNPJ checksum failed
    InvalidCnpj,
    /// Another record already uses this e-mail
    EmailTaken,
    /// Another user already has this CPF
    CpfTaken,
    /// Another organization already has this CNPJ
    CnpjTaken,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rejection::InvalidEmail => "E-mail is invalid",
            Rejection::InvalidCpf => "CPF is invalid",
            Rejection::InvalidCnpj => "CNPJ is invalid",
            Rejection::EmailTaken => "E-mail is already registered",
            Rejection::CpfTaken => "CPF is already registered to another user",
            Rejection::CnpjTaken => "CNPJ is already registered to another organization",
        };
        f.write_str(msg)
    }
}

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An authenticated endpoint was called without a token
    #[error("Not logged in - no session token")]
    Unauthenticated,

    /// The backend rejected the token (401)
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Message from the API
        message: String,
    },

    /// The backend refused the action (403)
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Message from the API
        message: String,
    },

    /// Record not found (404)
    #[error("Not found: {resource}")]
    NotFound {
        /// What was requested
        resource: String,
    },

    /// Field validation failed on the backend (422)
    #[error("Validation failed: {message}")]
    Validation {
        /// Summary message
        message: String,
        /// Messages per field, in the order the server listed them
        errors: Vec<(String, Vec<String>)>,
    },

    /// API returned another error response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Submission refused by a client-side domain check
    #[error("{0}")]
    Rejected(Rejection),

    /// Form input failed client-side validation
    #[error("Invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// Error from the core crate (session, schedule, documents)
    #[error(transparent)]
    Core(#[from] comercio_core::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// Laravel sends a list per field; a bare string is taken as a one-item list.
fn messages(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(msg) => vec![msg.clone()],
        _ => Vec::new(),
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Build the error for a non-2xx response
    ///
    /// Laravel-style bodies are understood: `{"message": ..., "errors":
    /// {"field": ["..."]}}` for validation failures and `{"error": ...}` for
    /// domain refusals.
    #[must_use]
    pub fn from_response(status: u16, path: &str, body: &str) -> Self {
        let json: Option<Value> = serde_json::from_str(body).ok();
        let message = json
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("error")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                }
            });

        match status {
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound {
                resource: path.to_string(),
            },
            422 => {
                let errors = json
                    .as_ref()
                    .and_then(|v| v.get("errors"))
                    .and_then(Value::as_object)
                    .map(|fields| {
                        fields
                            .iter()
                            .map(|(field, msgs)| (field.clone(), messages(msgs)))
                            .collect()
                    })
                    .unwrap_or_default();
                Self::Validation { message, errors }
            }
            _ => Self::api_response(status, message),
        }
    }

    /// First message of every invalid field, in field order
    ///
    /// Client-side input errors and backend validation errors are both
    /// flattened here so callers can show them one at a time.
    #[must_use]
    pub fn field_messages(&self) -> Vec<(String, String)> {
        match self {
            Self::Validation { errors, .. } => errors
                .iter()
                .filter_map(|(field, msgs)| msgs.first().map(|m| (field.clone(), m.clone())))
                .collect(),
            Self::InvalidInput(errors) => errors
                .iter()
                .map(|e| (e.field.clone(), e.message.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Check if this is a client error (4xx or a local rejection)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::ApiResponse { status, .. } => (400..500).contains(status),
            Self::Unauthorized { .. }
            | Self::Forbidden { .. }
            | Self::NotFound { .. }
            | Self::Validation { .. }
            | Self::Rejected(_)
            | Self::InvalidInput(_)
            | Self::Unauthenticated => true,
            _ => false,
        }
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }

    /// Message fit for showing to the user as-is
    ///
    /// Backend refusals carry their own wording (for example why a fair
    /// cannot be deleted); that text is returned without the status prefix.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiResponse { message, .. }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// The rejection, if this error is one
    #[must_use]
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(r) => Some(*r),
            _ => None,
        }
    }
}
