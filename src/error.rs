//! Error Types
//!
//! Every failure that can cross the connection boundary is one of the
//! variants below. Backends never leak their native status codes directly:
//! each backend funnels native errors through its `check_result` function,
//! which produces one of these kinds.

use thiserror::Error;

/// Errors produced by the command layer, the generic connection and the drivers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Null or malformed call arguments
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted without an active native handle
    #[error("not connected")]
    NotConnected,

    /// Native connect failure, carries the backend diagnostic text
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// No registered command matches the input
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A command was matched but called with the wrong number of arguments
    #[error("wrong number of arguments for '{command}' (got {given}), usage: {command} {usage}")]
    InvalidArgumentCount {
        command: String,
        usage: String,
        given: usize,
    },

    /// The requested key does not exist
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The requested database does not exist
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// The backend has no native equivalent for the operation
    #[error("{operation} is not supported by the {backend} backend")]
    NotSupported { operation: String, backend: String },

    /// Cooperative cancellation was observed
    #[error("interrupted")]
    Interrupted,

    /// Any other backend status, with its original code and message
    #[error("native error {code}: {message}")]
    NativeError { code: i64, message: String },
}

impl Error {
    /// Shorthand for `Error::InvalidArgument`.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Shorthand for `Error::NotSupported`.
    pub fn not_supported(operation: impl Into<String>, backend: impl Into<String>) -> Self {
        Error::NotSupported {
            operation: operation.into(),
            backend: backend.into(),
        }
    }

    /// Returns true for the cooperative-cancellation error.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_count_message_includes_usage() {
        let err = Error::InvalidArgumentCount {
            command: "SET".to_string(),
            usage: "<key> <value>".to_string(),
            given: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("SET <key> <value>"));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn test_native_error_keeps_code() {
        let err = Error::NativeError {
            code: -7,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "native error -7: boom");
        assert!(!err.is_interrupted());
        assert!(Error::Interrupted.is_interrupted());
    }
}
