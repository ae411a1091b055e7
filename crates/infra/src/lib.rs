//! # Kompete Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport
//! - The backend API client and its session store
//! - HTTP adapters for the report and sub-report ports
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `kompete-core`
//! - Depends on `kompete-domain` and `kompete-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientConfig, ApiError, HttpReportBackend, Session, SessionEvent, SessionStore,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use observability::init_tracing;
