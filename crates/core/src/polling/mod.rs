//! Job status polling
//!
//! [`StatusPoller`] drives one poll loop; [`TaskRegistry`] owns the loops of a
//! page session so that at most one runs per job and all of them stop on
//! teardown.

pub mod poller;
pub mod registry;

pub use poller::{PollOutcome, PollerConfig, StatusPoller};
pub use registry::TaskRegistry;
