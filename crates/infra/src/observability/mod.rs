//! Observability infrastructure
//!
//! Structured logging only: every crate emits `tracing` events and spans, and
//! the host installs a subscriber once at startup with [`init_tracing`].

pub mod logging;

pub use logging::{build_filter, init_tracing};
