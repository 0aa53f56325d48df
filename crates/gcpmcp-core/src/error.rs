//! Error types shared across the gcpmcp crates
//!
//! Upstream failures are classified by what the caller can do about them:
//! fix credentials, fix IAM bindings, fix the resource name, or try again
//! later. Local validation failures are raised before any request is sent.

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the workspace
pub type GcpResult<T> = Result<T, GcpError>;

#[derive(Debug, Error)]
pub enum GcpError {
    /// Missing or rejected credentials (HTTP 401, token acquisition failure)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Caller lacks the IAM permission for the resource (HTTP 403)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure, throttling or server-side error (429, 5xx)
    #[error("Transient upstream failure: {0}")]
    Transient(String),

    /// Any other non-success upstream status
    #[error("Upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Rejected locally before any network call
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    /// Upstream answered with a body we could not interpret
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GcpError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Classify a non-success HTTP status from a Google API
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Auth(message),
            403 => Self::PermissionDenied(message),
            404 => Self::NotFound(message),
            408 | 429 | 500..=599 => Self::Transient(message),
            _ => Self::Upstream { status, message },
        }
    }

    /// Short stable label, used as a structured logging field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::PermissionDenied(_) => "permission_denied",
            Self::NotFound(_) => "not_found",
            Self::Transient(_) => "transient",
            Self::Upstream { .. } => "upstream",
            Self::Validation(_) => "validation",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::Decode(_) => "decode",
            Self::Tool(_) => "tool",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}
