//! Form input validation
//!
//! Provides best-effort client-side checks before a record is submitted:
//! required fields, minimum lengths, email shape and document checksums. The
//! backend stays the authority; these checks only catch mistakes early.
//!
//! # Example
//!
//! ```rust
//! use comercio_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("name", "Ana")
//!     .min_length("name", "Ana", 3)
//!     .email("email", "ana@example.com")
//!     .cpf("cpf", "529.982.247-25")
//!     .validate();
//!
//! assert!(result.is_valid());
//! ```

use crate::documents::{is_valid_cnpj, is_valid_cpf, normalize_cep};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl ValidationError {
    fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            code: code.to_string(),
            expected: None,
            actual: None,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors, in the order the rules ran
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// First failing rule, if any
    #[must_use]
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Consume the result, keeping only the errors
    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }
}

/// Fluent validator builder
#[derive(Default)]
pub struct Validator {
    result: ValidationResult,
}

impl Validator {
    /// Create a new validator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that a field is not empty
    #[must_use]
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            let mut err = ValidationError::new(field, "REQUIRED", "Field is required");
            err.expected = Some("non-empty value".to_string());
            err.actual = Some("empty".to_string());
            self.result.add_error(err);
        }
        self
    }

    /// Validate that an id was chosen
    #[must_use]
    pub fn required_id(mut self, field: &str, value: Option<i64>) -> Self {
        if value.is_none_or(|id| id <= 0) {
            self.result
                .add_error(ValidationError::new(field, "REQUIRED", "Field is required"));
        }
        self
    }

    /// Validate minimum length in characters
    #[must_use]
    pub fn min_length(mut self, field: &str, value: &str, min: usize) -> Self {
        let len = value.chars().count();
        if len < min {
            let mut err = ValidationError::new(
                field,
                "MIN_LENGTH",
                format!("Must be at least {min} characters"),
            );
            err.expected = Some(format!(">= {min} chars"));
            err.actual = Some(format!("{len} chars"));
            self.result.add_error(err);
        }
        self
    }

    /// Validate email shape; empty values are left to `required`
    #[must_use]
    pub fn email(mut self, field: &str, value: &str) -> Self {
        if !value.is_empty() && !EMAIL_RE.is_match(value) {
            let mut err = ValidationError::new(field, "EMAIL", "Must be a valid e-mail address");
            err.actual = Some(value.to_string());
            self.result.add_error(err);
        }
        self
    }

    /// Validate a CPF checksum; empty values are left to `required`
    #[must_use]
    pub fn cpf(mut self, field: &str, value: &str) -> Self {
        if !value.is_empty() && !is_valid_cpf(value) {
            self.result
                .add_error(ValidationError::new(field, "CPF", "CPF is invalid"));
        }
        self
    }

    /// Validate a CNPJ checksum; empty values are left to `required`
    #[must_use]
    pub fn cnpj(mut self, field: &str, value: &str) -> Self {
        if !value.is_empty() && !is_valid_cnpj(value) {
            self.result
                .add_error(ValidationError::new(field, "CNPJ", "CNPJ is invalid"));
        }
        self
    }

    /// Validate a CEP shape; empty values are left to `required`
    #[must_use]
    pub fn cep(mut self, field: &str, value: &str) -> Self {
        if !value.is_empty() && normalize_cep(value).is_none() {
            let mut err = ValidationError::new(field, "CEP", "CEP must have 8 digits");
            err.expected = Some("00000-000".to_string());
            err.actual = Some(value.to_string());
            self.result.add_error(err);
        }
        self
    }

    /// Add a custom validation
    #[must_use]
    pub fn custom<F>(mut self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(message) = f() {
            self.result
                .add_error(ValidationError::new(field, "CUSTOM", message));
        }
        self
    }

    /// Complete validation and return result
    #[must_use]
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        let result = Validator::new().required("name", "").validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "REQUIRED");

        let result = Validator::new().required("name", "  ").validate();
        assert!(!result.is_valid());

        let result = Validator::new().required("name", "Feira").validate();
        assert!(result.is_valid());
    }

    #[test]
    fn test_required_id() {
        assert!(!Validator::new().required_id("bairro_id", None).validate().is_valid());
        assert!(!Validator::new().required_id("bairro_id", Some(0)).validate().is_valid());
        assert!(Validator::new().required_id("bairro_id", Some(3)).validate().is_valid());
    }

    #[test]
    fn test_min_length_counts_chars() {
        assert!(Validator::new().min_length("name", "Zé ", 3).validate().is_valid());
        assert!(!Validator::new().min_length("name", "Zé", 3).validate().is_valid());
    }

    #[test]
    fn test_email() {
        assert!(Validator::new().email("email", "ana@ufape.edu.br").validate().is_valid());
        assert!(!Validator::new().email("email", "ana@").validate().is_valid());
        assert!(!Validator::new().email("email", "ana ufape.edu.br").validate().is_valid());
        // emptiness belongs to `required`
        assert!(Validator::new().email("email", "").validate().is_valid());
    }

    #[test]
    fn test_documents() {
        let result = Validator::new()
            .cpf("cpf", "529.982.247-26")
            .cnpj("cnpj", "11.222.333/0001-81")
            .cep("cep", "55292-27")
            .validate();

        let fields: Vec<&str> = result.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["cpf", "cep"]);
    }

    #[test]
    fn test_errors_keep_rule_order() {
        let result = Validator::new()
            .min_length("name", "Al", 3)
            .required("email", "")
            .required("password", "")
            .validate();

        assert_eq!(result.first().unwrap().field, "name");
        assert_eq!(result.errors().len(), 3);
    }

    #[test]
    fn test_custom() {
        let result = Validator::new()
            .custom("horarios", || Some("closing must follow opening".to_string()))
            .custom("nome", || None)
            .validate();
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].code, "CUSTOM");
    }
}
