//! Unified error types for the CGT ecosystem
//!
//! This module provides a common error type [`CgtError`] that can represent
//! errors from any part of the system. Domain-specific error types can be
//! converted to `CgtError` for uniform error handling at API boundaries.

use thiserror::Error;

/// Unified error type for all CGT operations.
///
/// Allows errors from IO, parsing, configuration, and solving to be handled
/// uniformly at the top of the call stack.
#[derive(Error, Debug)]
pub enum CgtError {
    /// I/O errors (file access, directory creation, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or malformed configuration (fatal before generation starts)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Solver/algorithm errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using CgtError.
pub type CgtResult<T> = Result<T, CgtError>;

impl From<anyhow::Error> for CgtError {
    fn from(err: anyhow::Error) -> Self {
        CgtError::Other(err.to_string())
    }
}

impl From<String> for CgtError {
    fn from(s: String) -> Self {
        CgtError::Other(s)
    }
}

impl From<&str> for CgtError {
    fn from(s: &str) -> Self {
        CgtError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CgtError {
    fn from(err: serde_json::Error) -> Self {
        CgtError::Parse(err.to_string())
    }
}
