//! API-specific error types
//!
//! Classifies failed backend calls before they cross into the domain as
//! [`KompeteError`].

use std::time::Duration;

use kompete_domain::KompeteError;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401 - the session is no longer valid
    Authentication,
    /// 404 - project, report or version does not exist
    NotFound,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except 401/404)
    Client,
    /// Network/connection errors and timeouts
    Network,
    /// Response body did not have the expected shape
    Decode,
    /// Configuration errors
    Config,
}

/// API operation errors
///
/// `Server` and `Client` carry the backend's own `error` message, or the
/// generic "Request failed" when the body had none.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::NotFound(_) => ApiErrorCategory::NotFound,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Whether asking again later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.category(), ApiErrorCategory::Server | ApiErrorCategory::Network)
    }
}

impl From<ApiError> for KompeteError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => Self::Auth(message),
            ApiError::NotFound(message) => Self::NotFound(message),
            ApiError::Server(message) | ApiError::Client(message) => Self::Backend(message),
            ApiError::Network(message) => Self::Network(message),
            ApiError::Timeout(after) => Self::Timeout(format!("no response after {after:?}")),
            ApiError::Decode(message) => Self::Decode(message),
            ApiError::Config(message) => Self::Config(message),
        }
    }
}

/// Transport failures surface from [`crate::http::HttpClient`] as domain
/// errors already; fold them back into the API taxonomy.
impl From<KompeteError> for ApiError {
    fn from(err: KompeteError) -> Self {
        match err {
            KompeteError::Auth(message) => Self::Auth(message),
            KompeteError::NotFound(message) => Self::NotFound(message),
            KompeteError::Backend(message) | KompeteError::InvalidInput(message) => {
                Self::Client(message)
            }
            KompeteError::Decode(message) => Self::Decode(message),
            KompeteError::Config(message) => Self::Config(message),
            KompeteError::Timeout(message) | KompeteError::Network(message) => {
                Self::Network(message)
            }
            KompeteError::Internal(message) => Self::Server(message),
            KompeteError::Cancelled => Self::Network("request cancelled".into()),
        }
    }
}
