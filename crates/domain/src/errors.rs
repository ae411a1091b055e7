//! Error types used throughout the report pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Kompete
///
/// Every variant carries a plain message so the error stays `Clone`; pending
/// fetches are shared between several waiters and each of them receives a
/// copy of the outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum KompeteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-2xx response carrying the backend's own message.
    #[error("{0}")]
    Backend(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KompeteError {
    /// Whether this error must force the session to sign out.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Transient errors are retried silently by the status poller.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Auth(_) | Self::Config(_) | Self::Cancelled)
    }

    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::Backend(_) => "backend",
            Self::InvalidInput(_) => "invalid_input",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for KompeteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for Kompete operations
pub type Result<T> = std::result::Result<T, KompeteError>;
