//! # Kompete Domain
//!
//! Business domain types for the Kompete competitive-intelligence reports.
//!
//! This crate contains:
//! - Report identifiers, job status and generation responses
//! - Report payloads and per-entity sub-reports
//! - The payload normalizer that repairs LLM shape drift
//! - Domain error types and configuration structures
//!
//! ## Architecture
//! - No dependencies on other Kompete crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
// Re-export normalizer entry points
pub use utils::normalize::{normalize, ClaimsShape, NORMALIZED_SECTIONS};
