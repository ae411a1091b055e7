//! Kompete backend API
//!
//! HTTP adapters for the report ports defined in `kompete-core`.
//!
//! # Architecture
//!
//! - Uses [`crate::http::HttpClient`] (no direct reqwest calls)
//! - Tenant and caller identity headers from the shared [`SessionStore`]
//! - A 401 anywhere signs the session out before the error propagates
//! - No retries: the status poller and the user decide when to ask again

pub mod client;
pub mod errors;
pub mod reports;
pub mod session;

pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use errors::{ApiError, ApiErrorCategory};
pub use reports::HttpReportBackend;
pub use session::{Session, SessionEvent, SessionStore};
