//! Error types for the ServiceNow alert forwarder
//!
//! Every failure in the pipeline maps onto one of these variants and
//! propagates to the orchestrator, which logs it and exits non-zero.

use thiserror::Error;

/// Main error type for alert forwarding operations
#[derive(Error, Debug)]
pub enum AlertError {
    /// Configuration file missing or unparseable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Argument vector cannot be parsed into an event
    #[error("Decode error: {0}")]
    Decode(String),

    /// Well-formed event that is not a health-rule violation
    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    /// Id-store I/O or lock failure
    #[error("Store error: {0}")]
    Store(String),

    /// Network, TLS, proxy failure or non-2xx response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Successful HTTP but the response is missing the sys_id
    #[error("Response parse error: {0}")]
    ResponseParse(String),
}

impl AlertError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AlertError::Config(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        AlertError::Decode(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        AlertError::Store(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        AlertError::Transport(msg.into())
    }

    /// Check if this is the expected skip for non-violation events
    pub fn is_unsupported_event(&self) -> bool {
        matches!(self, AlertError::UnsupportedEvent(_))
    }
}

impl From<std::io::Error> for AlertError {
    fn from(err: std::io::Error) -> Self {
        AlertError::Store(err.to_string())
    }
}

impl From<serde_yaml::Error> for AlertError {
    fn from(err: serde_yaml::Error) -> Self {
        AlertError::Config(format!("YAML error: {}", err))
    }
}

impl From<reqwest::Error> for AlertError {
    fn from(err: reqwest::Error) -> Self {
        AlertError::Transport(err.to_string())
    }
}

/// Result type alias for alert forwarding operations
pub type Result<T> = std::result::Result<T, AlertError>;
