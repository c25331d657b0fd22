//! Error kinds for validation, timezone resolution, and sizing.
//!
//! Validation failures are values: the validator collects every field-level
//! [`ValidationError`] it finds and returns them together. [`CoreError`] is the
//! single error type callers match on when they use the `Result`-returning
//! convenience wrappers.

use serde::Serialize;
use std::fmt;

/// Category of a single validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Malformed, missing, or out-of-range field.
    SchemaInvalid,
    /// `pattern` names a discriminant the compiler does not support.
    UnsupportedPattern,
    /// `instrument.symbol` is absent from the instrument registry.
    UnknownInstrument,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SchemaInvalid => "schema_invalid",
            Self::UnsupportedPattern => "unsupported_pattern",
            Self::UnknownInstrument => "unknown_instrument",
        };
        f.write_str(s)
    }
}

/// A field-level validation failure.
///
/// `path` is a dotted path into the document (`risk.riskPercent`,
/// `entry.stop.value`); `$` denotes the document root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ValidationErrorKind::SchemaInvalid,
            message: message.into(),
        }
    }

    pub fn unsupported_pattern(path: impl Into<String>, found: &str, expected: &[&str]) -> Self {
        Self {
            path: path.into(),
            kind: ValidationErrorKind::UnsupportedPattern,
            message: format!(
                "unsupported pattern '{found}' (expected one of: {})",
                expected.join(", ")
            ),
        }
    }

    pub fn unknown_instrument(path: impl Into<String>, symbol: &str) -> Self {
        Self {
            path: path.into(),
            kind: ValidationErrorKind::UnknownInstrument,
            message: format!("unknown instrument '{symbol}'"),
        }
    }
}

/// Top-level error type for canonstrat-core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("canonical strategy is invalid: {}", summarize(.errors))]
    SchemaInvalid { errors: Vec<ValidationError> },

    #[error("unsupported pattern: {0}")]
    UnsupportedPattern(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("degenerate risk: entry {entry} and stop {stop} have no distance between them")]
    DegenerateRisk { entry: f64, stop: f64 },

    #[error("unrecognized timezone: {0}")]
    TimezoneUnresolved(String),
}

impl CoreError {
    /// Field-level errors carried by `SchemaInvalid`; empty for every other variant.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::SchemaInvalid { errors } => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
