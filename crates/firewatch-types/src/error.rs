//! Error types for data parsing in firewatch-types.

use thiserror::Error;

/// Errors that can occur when parsing Firewatch field names or values.
///
/// This error type is transport-agnostic and does not include
/// network errors (those belong in firewatch-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The name does not match any editable threshold field.
    #[error("Unknown threshold field: {0}")]
    UnknownField(String),

    /// The value is not a finite number.
    #[error("Invalid value for {field}: '{value}' is not a finite number")]
    InvalidNumber {
        /// The field the value was meant for.
        field: String,
        /// The rejected input, verbatim.
        value: String,
    },
}

/// Result type alias using firewatch-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
