//! Per-entity sub-reports: cache, background prefetch, and the backend loader

pub mod cache;
pub mod loader;
pub mod prefetch;

use async_trait::async_trait;
use kompete_domain::{EntityKey, Result, SubReport};

pub use cache::{EntityReportCache, Lookup, PendingFetch};
pub use loader::SubReportLoader;
pub use prefetch::{PrefetchScheduler, PrefetchSummary};

/// Trait for fetching one entity's sub-report
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    /// Fetch the sub-report for `key`; `refresh` asks the backend to regenerate it
    async fn fetch(&self, key: &EntityKey, refresh: bool) -> Result<SubReport>;
}
