//! Staggered background prefetch of sub-reports

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use kompete_domain::{EntityKey, KompeteError, PrefetchConfig};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cache::EntityReportCache;
use crate::polling::TaskRegistry;

const PREFETCH_TASK: &str = "prefetch";

/// Counts reported by one prefetch walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub initiated: usize,
    /// Keys already cached or in flight when their turn came.
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Walks entity keys in order, starting one fetch per stagger interval
///
/// Only fetch *initiations* are paced; completions may arrive in any order.
/// The walk runs once per page session: [`start`](Self::start) is a no-op
/// after the first call, [`restart`](Self::restart) replaces a running walk.
pub struct PrefetchScheduler {
    cache: Arc<EntityReportCache>,
    stagger: Duration,
    started: AtomicBool,
    tasks: TaskRegistry<&'static str>,
}

impl PrefetchScheduler {
    pub fn new(cache: Arc<EntityReportCache>, stagger: Duration) -> Self {
        Self { cache, stagger, started: AtomicBool::new(false), tasks: TaskRegistry::new() }
    }

    pub fn from_config(cache: Arc<EntityReportCache>, config: &PrefetchConfig) -> Self {
        Self::new(cache, Duration::from_millis(config.stagger_ms))
    }

    pub fn stagger(&self) -> Duration {
        self.stagger
    }

    /// Start the walk unless one was already started. Returns whether it was.
    pub fn start(&self, keys: Vec<EntityKey>) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("prefetch already started for this session");
            return false;
        }
        self.spawn(keys);
        true
    }

    /// Cancel any running walk and start over with `keys`.
    pub fn restart(&self, keys: Vec<EntityKey>) {
        self.started.store(true, Ordering::SeqCst);
        self.spawn(keys);
    }

    pub fn stop(&self) {
        self.tasks.stop(&PREFETCH_TASK);
    }

    /// Stop the walk for good; later starts are ignored.
    pub fn shutdown(&self) {
        self.started.store(true, Ordering::SeqCst);
        self.tasks.stop_all();
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.tasks.is_active(&PREFETCH_TASK)
    }

    /// Run one walk on the current task.
    pub async fn run(&self, keys: &[EntityKey], cancel: &CancellationToken) -> PrefetchSummary {
        walk(&self.cache, keys, self.stagger, cancel).await
    }

    fn spawn(&self, keys: Vec<EntityKey>) {
        let cache = Arc::clone(&self.cache);
        let stagger = self.stagger;
        self.tasks.start(PREFETCH_TASK, move |token| async move {
            walk(&cache, &keys, stagger, &token).await;
        });
    }
}

async fn walk(
    cache: &EntityReportCache,
    keys: &[EntityKey],
    stagger: Duration,
    cancel: &CancellationToken,
) -> PrefetchSummary {
    info!(entities = keys.len(), stagger_ms = stagger.as_millis() as u64, "prefetch started");
    let mut summary = PrefetchSummary::default();
    let mut last_initiated: Option<Instant> = None;
    let mut pending = Vec::with_capacity(keys.len());

    for key in keys {
        if cache.is_known(key) {
            summary.skipped += 1;
            continue;
        }

        if let Some(last) = last_initiated {
            tokio::select! {
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                _ = tokio::time::sleep_until(last + stagger) => {}
            }
            // The user may have opened this tab while we waited.
            if cache.is_known(key) {
                summary.skipped += 1;
                continue;
            }
        }

        last_initiated = Some(Instant::now());
        debug!(entity = %key, "prefetching sub-report");
        pending.push(cache.request(key));
        summary.initiated += 1;
    }

    if !summary.cancelled {
        tokio::select! {
            _ = cancel.cancelled() => summary.cancelled = true,
            outcomes = join_all(pending) => {
                summary.failed = outcomes
                    .iter()
                    .filter(|o| matches!(o, Err(err) if *err != KompeteError::Cancelled))
                    .count();
            }
        }
    }

    info!(
        initiated = summary.initiated,
        skipped = summary.skipped,
        failed = summary.failed,
        cancelled = summary.cancelled,
        "prefetch finished"
    );
    summary
}
