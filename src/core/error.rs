//! Warden error types

use thiserror::Error;

/// Errors that can occur while resolving a tool request
#[derive(Error, Debug)]
pub enum WardenError {
    /// Request did not match the expected shape
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded or saved
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl WardenError {
    /// Create an invalid-request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        WardenError::InvalidRequest(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        WardenError::Config(msg.into())
    }

    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        WardenError::Other(msg.into())
    }
}

/// Result type alias for warden operations
pub type WardenResult<T> = Result<T, WardenError>;
