//! Error types for Rowscope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for Rowscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error reported by a SQL executor.
///
/// Connection failures, syntax errors and permission errors all share this
/// one shape; nothing in Rowscope distinguishes between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Human-readable message from the database or transport.
    pub message: String,
    /// SQLSTATE code, when the database supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// 1-based character position of the error in the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl ExecutionError {
    /// Creates an execution error with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            position: None,
        }
    }

    /// Sets the SQLSTATE code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the error position.
    #[must_use]
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (SQLSTATE {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ExecutionError {}

/// The main error type for Rowscope.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The executor failed to run the statement.
    #[error("SQL execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// The caller cancelled the request before a result arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The executor returned rows that do not describe a count.
    #[error("malformed count result: {0}")]
    MalformedResult(String),

    /// A filter could not be interpreted.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the executor error, if this is one.
    #[must_use]
    pub fn as_execution(&self) -> Option<&ExecutionError> {
        match self {
            Self::Execution(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display() {
        let err = ExecutionError::new("permission denied for table users").with_code("42501");
        assert_eq!(
            err.to_string(),
            "permission denied for table users (SQLSTATE 42501)"
        );
        assert_eq!(ExecutionError::new("boom").to_string(), "boom");
    }

    #[test]
    fn test_execution_error_converts_unchanged() {
        let original = ExecutionError::new("syntax error").with_position(17);
        let err: Error = original.clone().into();
        assert_eq!(err.as_execution(), Some(&original));
        assert!(Error::Cancelled.as_execution().is_none());
    }
}
