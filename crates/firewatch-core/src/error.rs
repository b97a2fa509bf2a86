//! Error types for firewatch-core.
//!
//! Nothing in the core is fatal. The errors here describe why a single
//! operation did not happen; the monitor keeps polling regardless.
//!
//! # Error Taxonomy
//!
//! | Error | Origin | Handling |
//! |-------|--------|----------|
//! | [`GatewayError`] on a read | `fetch_*` | Replaced by the endpoint's fallback and logged; never returned |
//! | [`Error::Gateway`] on a write | `ThresholdEditSession::commit` | Returned to the caller and broadcast as a failure notification |
//! | [`Error::InvalidState`] | Edit session misuse | Returned; session state unchanged |
//! | [`Error::CommitInFlight`] | Second `commit` while saving | Returned; the in-flight commit is unaffected |
//! | [`Error::InvalidValue`] | `set_field` with non-finite input | Returned; draft field unchanged |
//! | [`Error::InvalidConfig`] | Bad poller options | Returned by `Monitor::start` / `Poller::start` |
//! | [`GatewayError::InvalidUrl`] | Base origin without `http://` or `https://` | Returned by `HttpGateway::new` |
//!
//! There is no retry or backoff: a failed poll cycle is superseded by the
//! next scheduled tick, and a failed threshold write is not retried.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur in the monitoring core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The remote gateway rejected or failed a request.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Operation not valid in the current edit state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the session was in.
        state: String,
    },

    /// A threshold commit is already in flight.
    #[error("A threshold update is already in progress")]
    CommitInFlight,

    /// User input could not be applied to a draft field.
    #[error(transparent)]
    InvalidValue(#[from] firewatch_types::ParseError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an invalid state error.
    pub fn invalid_state(operation: &'static str, state: impl std::fmt::Display) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type alias using firewatch-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use firewatch_types::ParseError;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_state("commit", "viewing");
        assert_eq!(err.to_string(), "Cannot commit while viewing");

        let err = Error::CommitInFlight;
        assert!(err.to_string().contains("already in progress"));

        let err = Error::invalid_config("poll_interval must be > 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: poll_interval must be > 0"
        );
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = ParseError::UnknownField("humidity_max".to_string()).into();
        assert!(matches!(err, Error::InvalidValue(_)));
        assert!(err.to_string().contains("humidity_max"));
    }

    #[test]
    fn test_gateway_error_conversion() {
        let err: Error = GatewayError::InvalidUrl("ftp://x".to_string()).into();
        assert!(matches!(err, Error::Gateway(_)));
        assert!(err.to_string().contains("ftp://x"));
    }
}
