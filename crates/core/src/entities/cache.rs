//! Per-entity sub-report cache with at most one fetch in flight per key

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt, Shared};
use kompete_domain::{EntityKey, KompeteError, Result, SubReport};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::EntityFetcher;

/// Fetch shared by every caller waiting on the same key
pub type PendingFetch = Shared<BoxFuture<'static, Result<SubReport>>>;

/// Answer of [`EntityReportCache::get`]
pub enum Lookup {
    Ready(SubReport),
    /// A fetch is outstanding; await it to receive the result.
    Pending(PendingFetch),
}

impl Lookup {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

struct InFlight {
    generation: u64,
    fetch: PendingFetch,
    abort: AbortHandle,
}

#[derive(Default)]
struct CacheState {
    reports: HashMap<EntityKey, SubReport>,
    in_flight: HashMap<EntityKey, InFlight>,
    /// Bumped by every fetch start and explicit write; a completion is only
    /// stored while its generation is still current.
    generations: HashMap<EntityKey, u64>,
}

impl CacheState {
    fn next_generation(&mut self, key: &EntityKey) -> u64 {
        let generation = self.generations.entry(key.clone()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn current_generation(&self, key: &EntityKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

enum Attached {
    Cached(SubReport),
    InFlight { generation: u64, fetch: PendingFetch },
}

/// Sub-reports of one report page, keyed by entity
///
/// Fetches run as spawned tasks, so a fetch started by [`get`](Self::get)
/// makes progress even when nobody awaits it. Concurrent requests for the
/// same key attach to the outstanding fetch instead of issuing another.
pub struct EntityReportCache {
    fetcher: Arc<dyn EntityFetcher>,
    state: Arc<Mutex<CacheState>>,
}

impl EntityReportCache {
    pub fn new(fetcher: Arc<dyn EntityFetcher>) -> Self {
        Self { fetcher, state: Arc::new(Mutex::new(CacheState::default())) }
    }

    /// Cached report, or the pending fetch for it (started if necessary).
    pub fn get(&self, key: &EntityKey) -> Lookup {
        match self.attach(key) {
            Attached::Cached(report) => Lookup::Ready(report),
            Attached::InFlight { fetch, .. } => Lookup::Pending(fetch),
        }
    }

    /// Start (or join) the fetch for `key` and return it without waiting.
    pub fn request(&self, key: &EntityKey) -> PendingFetch {
        match self.attach(key) {
            Attached::Cached(report) => futures::future::ready(Ok(report)).boxed().shared(),
            Attached::InFlight { fetch, .. } => fetch,
        }
    }

    /// Cached report, or wait for it to be fetched.
    ///
    /// A waiter whose fetch is superseded by [`refresh`](Self::refresh)
    /// re-attaches to the newer one.
    pub async fn load(&self, key: &EntityKey) -> Result<SubReport> {
        loop {
            let (generation, fetch) = match self.attach(key) {
                Attached::Cached(report) => return Ok(report),
                Attached::InFlight { generation, fetch } => (generation, fetch),
            };
            match fetch.await {
                Err(KompeteError::Cancelled) if self.superseded(key, generation) => continue,
                outcome => return outcome,
            }
        }
    }

    /// Drop the cached report and fetch a fresh one with `refresh = true`.
    ///
    /// Any fetch already in flight for the key is aborted; its result could
    /// only be older than the one requested here.
    pub async fn refresh(&self, key: &EntityKey) -> Result<SubReport> {
        info!(entity = %key, "refreshing sub-report");
        let (generation, fetch) = {
            let mut state = self.state.lock();
            state.reports.remove(key);
            if let Some(previous) = state.in_flight.remove(key) {
                previous.abort.abort();
                debug!(entity = %key, generation = previous.generation, "aborted superseded fetch");
            }
            self.begin(&mut state, key, true)
        };

        match fetch.await {
            Err(KompeteError::Cancelled) if self.superseded(key, generation) => self.load(key).await,
            outcome => outcome,
        }
    }

    pub fn cached(&self, key: &EntityKey) -> Option<SubReport> {
        self.state.lock().reports.get(key).cloned()
    }

    /// Remove the cached report so the next request fetches again.
    pub fn invalidate(&self, key: &EntityKey) -> Option<SubReport> {
        self.state.lock().reports.remove(key)
    }

    /// Store a report without touching other keys. Results of fetches that
    /// were already in flight for the key are discarded.
    pub fn upsert(&self, report: SubReport) {
        let mut state = self.state.lock();
        state.next_generation(&report.entity);
        state.reports.insert(report.entity.clone(), report);
    }

    pub fn is_in_flight(&self, key: &EntityKey) -> bool {
        self.state.lock().in_flight.contains_key(key)
    }

    /// Whether `key` is cached or being fetched.
    pub fn is_known(&self, key: &EntityKey) -> bool {
        let state = self.state.lock();
        state.reports.contains_key(key) || state.in_flight.contains_key(key)
    }

    /// Number of cached reports.
    pub fn len(&self) -> usize {
        self.state.lock().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every outstanding fetch and forget all reports.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        for (_, in_flight) in state.in_flight.drain() {
            in_flight.abort.abort();
        }
        state.reports.clear();
    }

    fn attach(&self, key: &EntityKey) -> Attached {
        let mut state = self.state.lock();
        if let Some(report) = state.reports.get(key) {
            return Attached::Cached(report.clone());
        }
        if let Some(in_flight) = state.in_flight.get(key) {
            debug!(entity = %key, "joining in-flight fetch");
            return Attached::InFlight {
                generation: in_flight.generation,
                fetch: in_flight.fetch.clone(),
            };
        }
        let (generation, fetch) = self.begin(&mut state, key, false);
        Attached::InFlight { generation, fetch }
    }

    /// Spawn a fetch and register it. Runs under the state lock so the
    /// registration is visible before the fetch can settle.
    fn begin(&self, state: &mut CacheState, key: &EntityKey, refresh: bool) -> (u64, PendingFetch) {
        let generation = state.next_generation(key);
        let (abort, registration) = AbortHandle::new_pair();
        let fetcher = Arc::clone(&self.fetcher);
        let shared_state = Arc::clone(&self.state);
        let entity = key.clone();

        let fetch = async move {
            let outcome = Abortable::new(fetcher.fetch(&entity, refresh), registration)
                .await
                .unwrap_or(Err(KompeteError::Cancelled));
            settle(&shared_state, &entity, generation, &outcome);
            outcome
        }
        .boxed()
        .shared();

        tokio::spawn(fetch.clone());
        debug!(entity = %key, generation, refresh, "started sub-report fetch");
        state.in_flight.insert(key.clone(), InFlight { generation, fetch: fetch.clone(), abort });
        (generation, fetch)
    }

    fn superseded(&self, key: &EntityKey, generation: u64) -> bool {
        self.state.lock().current_generation(key) != generation
    }
}

fn settle(
    state: &Mutex<CacheState>,
    key: &EntityKey,
    generation: u64,
    outcome: &Result<SubReport>,
) {
    let mut state = state.lock();
    if state.in_flight.get(key).is_some_and(|f| f.generation == generation) {
        state.in_flight.remove(key);
    }

    match outcome {
        Ok(report) if state.current_generation(key) == generation => {
            state.reports.insert(key.clone(), report.clone());
            debug!(entity = %key, generation, "cached sub-report");
        }
        Ok(_) => debug!(entity = %key, generation, "discarded stale sub-report"),
        Err(KompeteError::Cancelled) => {}
        Err(err) => warn!(entity = %key, error = %err, kind = err.label(), "sub-report fetch failed"),
    }
}
