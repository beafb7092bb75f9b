// src/error.rs

//! Unified error handling for the Pathwise client library.

use std::fmt;

use thiserror::Error;

/// Result type alias for Pathwise operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Non-2xx response
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Request did not settle within its deadline
    #[error("{url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Structurally valid payload without any items
    #[error("Empty payload from {0}")]
    EmptyPayload(String),

    /// Payload shape did not match the expected content schema
    #[error("Schema mismatch: {0}")]
    Schema(String),

    /// Server answered but reported a failure in its response body
    #[error("Server error: {0}")]
    Remote(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication failed
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AppError {
    /// Create a status error for a URL.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a timeout error for a URL.
    pub fn timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_ms,
        }
    }

    /// Create a schema mismatch error.
    pub fn schema(message: impl fmt::Display) -> Self {
        Self::Schema(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures caused by the transport rather than the payload.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Timeout { .. } | Self::Io(_) => true,
            _ => false,
        }
    }
}

/// Authentication failures surfaced to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Neither the identity provider nor the backend could be reached
    #[error("Cannot reach the authentication server: {0}")]
    Unreachable(String),

    /// Credentials were rejected
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Any other provider or backend failure
    #[error("Authentication failed: {0}")]
    Failed(String),
}

impl AuthError {
    /// Create a generic failure.
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}
