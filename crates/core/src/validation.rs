//! Request input validation
//!
//! A fluent [`Validator`] collects every problem with an input instead of
//! stopping at the first one, so a client sees all of them in one response.
//!
//! # Example
//!
//! ```rust
//! use catalog_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("name", "", "Name is required")
//!     .min_value("price", -1.0, 0.0, "Price must be a positive number")
//!     .validate();
//!
//! assert!(!result.is_valid());
//! assert_eq!(
//!     result.summary(),
//!     "Invalid input: Name is required, Price must be a positive number"
//! );
//! ```

use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
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
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Client-facing summary: `Invalid input: <msg>, <msg>`
    pub fn summary(&self) -> String {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        format!("Invalid input: {}", messages.join(", "))
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::new(ErrorCode::ValidationError, self.summary()))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    fn fail(
        mut self,
        field: &str,
        message: impl Into<String>,
        code: &str,
        expected: Option<String>,
        actual: Option<String>,
    ) -> Self {
        self.result.add_error(ValidationError {
            field: field.to_string(),
            message: message.into(),
            code: code.to_string(),
            expected,
            actual,
        });
        self
    }

    /// Validate that a field is not empty
    pub fn required(self, field: &str, value: &str, message: &str) -> Self {
        if value.is_empty() {
            return self.fail(
                field,
                message,
                "REQUIRED",
                Some("non-empty value".to_string()),
                Some("empty".to_string()),
            );
        }
        self
    }

    /// Validate minimum length in characters
    pub fn min_length(self, field: &str, value: &str, min: usize, message: &str) -> Self {
        let len = value.chars().count();
        if len < min {
            return self.fail(
                field,
                message,
                "MIN_LENGTH",
                Some(format!(">= {} chars", min)),
                Some(format!("{} chars", len)),
            );
        }
        self
    }

    /// Validate a numeric lower bound (inclusive)
    pub fn min_value<T: PartialOrd + std::fmt::Display>(
        self,
        field: &str,
        value: T,
        min: T,
        message: &str,
    ) -> Self {
        if value < min {
            return self.fail(
                field,
                message,
                "MIN_VALUE",
                Some(format!(">= {}", min)),
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate a number is finite (JSON cannot carry NaN, but computed values can)
    pub fn finite(self, field: &str, value: f64) -> Self {
        if !value.is_finite() {
            return self.fail(
                field,
                format!("{} must be a finite number", field),
                "FINITE",
                None,
                Some(value.to_string()),
            );
        }
        self
    }

    /// Validate an absolute URL
    pub fn url(self, field: &str, value: &str, message: &str) -> Self {
        match url::Url::parse(value) {
            Ok(parsed) if parsed.has_host() => self,
            _ => self.fail(
                field,
                message,
                "URL",
                Some("absolute URL".to_string()),
                Some(value.to_string()),
            ),
        }
    }

    /// Validate a UUID in hyphenated form
    pub fn uuid(self, field: &str, value: &str) -> Self {
        if value.len() == 36 && uuid::Uuid::parse_str(value).is_ok() {
            return self;
        }
        self.fail(
            field,
            "Invalid uuid",
            "UUID",
            Some("UUID".to_string()),
            Some(value.to_string()),
        )
    }

    /// Validate that an optional string parses as an integer of at least `min`
    ///
    /// Returns the parsed value alongside the validator so callers can use it.
    pub fn integer_at_least(
        self,
        field: &str,
        value: Option<&str>,
        min: i64,
    ) -> (Self, Option<i64>) {
        let Some(raw) = value else {
            return (self, None);
        };

        match raw.trim().parse::<f64>() {
            Ok(n) if n.fract() != 0.0 || !n.is_finite() => (
                self.fail(
                    field,
                    format!("Expected integer, received float for {}", field),
                    "INTEGER",
                    Some("integer".to_string()),
                    Some(raw.to_string()),
                ),
                None,
            ),
            Ok(n) if n < min as f64 => (
                self.fail(
                    field,
                    format!("{} must be greater than or equal to {}", field, min),
                    "MIN_VALUE",
                    Some(format!(">= {}", min)),
                    Some(raw.to_string()),
                ),
                None,
            ),
            Ok(n) => (self, Some(n as i64)),
            Err(_) => (
                self.fail(
                    field,
                    format!("Expected number, received nan for {}", field),
                    "NUMBER",
                    Some("number".to_string()),
                    Some(raw.to_string()),
                ),
                None,
            ),
        }
    }

    /// Validate that only `allowed` keys are present
    pub fn unknown_keys<'k, I>(self, keys: I, allowed: &[&str]) -> Self
    where
        I: IntoIterator<Item = &'k str>,
    {
        let unknown: Vec<String> = keys
            .into_iter()
            .filter(|key| !allowed.contains(key))
            .map(|key| format!("'{}'", key))
            .collect();

        if unknown.is_empty() {
            return self;
        }

        self.fail(
            "keys",
            format!("Unrecognized key(s) in object: {}", unknown.join(", ")),
            "UNRECOGNIZED_KEYS",
            Some(allowed.join(", ")),
            Some(unknown.join(", ")),
        )
    }

    /// Add a custom validation
    pub fn custom<F>(self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        match f() {
            Some(message) => self.fail(field, message, "CUSTOM", None, None),
            None => self,
        }
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}
