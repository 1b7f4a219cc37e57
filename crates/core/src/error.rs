//! Error types for the call agent

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the call agent
#[derive(Error, Debug)]
pub enum Error {
    /// Structurally invalid request (missing or malformed fields)
    #[error("Bad input: {0}")]
    BadInput(String),

    /// Unknown call identifier
    #[error("Call not found: {0}")]
    CallNotFound(String),

    /// Turn submitted against a terminated session
    #[error("Call has already ended: {0}")]
    CallEnded(String),

    /// Completion or synthesis provider failure.
    ///
    /// Recovered locally with a degraded response wherever possible; this
    /// variant exists for the seams between crates, not for HTTP surfaces.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution failure
    #[error("Tool error: {0}")]
    Tool(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Create a bad-input error from a string
    pub fn bad_input<S: Into<String>>(msg: S) -> Self {
        Error::BadInput(msg.into())
    }

    /// Create an internal error from a string
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
