//! # Kompete Core
//!
//! Report orchestration - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the report backend (traits)
//! - The status poller and the task registry owning poll loops
//! - The report generation client
//! - The per-entity sub-report cache and its staggered prefetch
//! - The report page controller
//!
//! ## Architecture Principles
//! - Only depends on `kompete-domain`
//! - No HTTP or platform code
//! - All external access via traits

pub mod entities;
pub mod polling;
pub mod report;

// Re-export specific items to avoid ambiguity
pub use entities::{
    EntityFetcher, EntityReportCache, Lookup, PendingFetch, PrefetchScheduler, PrefetchSummary,
    SubReportLoader,
};
pub use polling::{PollOutcome, PollerConfig, StatusPoller, TaskRegistry};
pub use report::{
    ControllerSettings, GenerateOutcome, RegenerateScope, ReportBackend, ReportGenerationClient,
    ReportTab, ReportViewController, SubReportSource, TabContent, TabDescriptor, ViewState,
};
