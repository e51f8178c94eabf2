use std::io;
use thiserror::Error;

/// Custom error type for vitalwatch
#[derive(Error, Debug)]
pub enum VitalsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for vitalwatch
pub type Result<T> = std::result::Result<T, VitalsError>;

impl VitalsError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        VitalsError::Config(msg.into())
    }

    /// Create an invalid endpoint error
    pub fn invalid_endpoint<S: Into<String>>(msg: S) -> Self {
        VitalsError::InvalidEndpoint(msg.into())
    }

    pub fn host<S: Into<String>>(msg: S) -> Self {
        VitalsError::Host(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        VitalsError::Other(msg.into())
    }
}
