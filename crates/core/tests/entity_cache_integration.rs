//! Per-entity cache and prefetch against the scripted sub-report source.

mod support;

use std::sync::Arc;
use std::time::Duration;

use kompete_core::{EntityReportCache, Lookup, PrefetchScheduler, SubReportLoader};
use kompete_domain::{EntityKey, MarketOverview, ProjectId};
use support::{review_payload, Call, MockBackend};
use tokio_util::sync::CancellationToken;

fn loader(backend: &Arc<MockBackend>) -> Arc<SubReportLoader> {
    let loader = Arc::new(SubReportLoader::new(ProjectId::new("p1"), backend.clone()));
    let overview: MarketOverview = serde_json::from_value(review_payload()).unwrap();
    loader.set_roster(&overview.competitors);
    loader
}

fn battlecards_for(backend: &MockBackend, id: &str) -> usize {
    backend.count(|c| matches!(c, Call::Battlecard { competitor, .. } if competitor == id))
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_share_one_fetch() {
    let backend = Arc::new(MockBackend::new(review_payload()));
    let cache = EntityReportCache::new(loader(&backend));
    let key = EntityKey::competitor("7");

    let (first, second) = tokio::join!(cache.load(&key), cache.load(&key));

    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(battlecards_for(&backend, "7"), 1);
}

#[tokio::test(start_paused = true)]
async fn get_while_pending_attaches_to_the_outstanding_fetch() {
    let backend = Arc::new(MockBackend::new(review_payload()));
    let cache = EntityReportCache::new(loader(&backend));
    let key = EntityKey::competitor("7");

    let Lookup::Pending(first) = cache.get(&key) else {
        panic!("nothing is cached yet");
    };
    let Lookup::Pending(second) = cache.get(&key) else {
        panic!("the first fetch is still outstanding");
    };

    assert_eq!(first.await.unwrap(), second.await.unwrap());
    assert!(cache.get(&key).is_ready());
    assert_eq!(battlecards_for(&backend, "7"), 1);
}

#[tokio::test(start_paused = true)]
async fn battlecard_request_carries_threat_context() {
    let backend = Arc::new(MockBackend::new(review_payload()));
    let cache = EntityReportCache::new(loader(&backend));

    let report = cache.load(&EntityKey::competitor("42")).await.unwrap();
    assert_eq!(report.analysis().unwrap()["threat"]["level"], "medium");
    assert_eq!(report.stats().unwrap()["avgRating"], 3.8);
}

#[tokio::test(start_paused = true)]
async fn unknown_competitor_is_not_fetched() {
    let backend = Arc::new(MockBackend::new(review_payload()));
    let cache = EntityReportCache::new(loader(&backend));

    assert!(cache.load(&EntityKey::competitor("404")).await.is_err());
    assert!(backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_wins_over_slow_prefetch() {
    let backend = Arc::new(
        MockBackend::new(review_payload()).with_sub_report_delay(Duration::from_secs(20)),
    );
    let cache = Arc::new(EntityReportCache::new(loader(&backend)));
    let key = EntityKey::competitor("9");

    let _prefetched = cache.request(&key);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let refreshed = cache.refresh(&key).await.unwrap();
    assert_eq!(refreshed.analysis().unwrap()["refresh"], true);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(cache.cached(&key).unwrap().analysis().unwrap()["refresh"], true);
}

#[tokio::test(start_paused = true)]
async fn prefetch_initiations_are_eight_seconds_apart() {
    let backend = Arc::new(
        MockBackend::new(review_payload()).with_sub_report_delay(Duration::from_secs(15)),
    );
    let cache = Arc::new(EntityReportCache::new(loader(&backend)));
    let scheduler = PrefetchScheduler::new(Arc::clone(&cache), Duration::from_millis(8000));
    let keys = vec![
        EntityKey::competitor("7"),
        EntityKey::competitor("42"),
        EntityKey::competitor("9"),
    ];

    let summary = scheduler.run(&keys, &CancellationToken::new()).await;
    assert_eq!(summary.initiated, 3);

    let started: Vec<_> = backend.timed_calls().into_iter().map(|(_, at)| at).collect();
    assert_eq!(started.len(), 3);
    assert!(started[1] - started[0] >= Duration::from_millis(8000));
    assert!(started[2] - started[1] >= Duration::from_millis(8000));
    // Completions overlap: the walk does not wait for one fetch to finish.
    assert!(started[1] - started[0] < Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn prefetch_failures_are_swallowed() {
    let backend = Arc::new(MockBackend::new(review_payload()).failing("comp-42"));
    let cache = Arc::new(EntityReportCache::new(loader(&backend)));
    let scheduler = PrefetchScheduler::new(Arc::clone(&cache), Duration::from_millis(8000));
    let keys = vec![
        EntityKey::competitor("7"),
        EntityKey::competitor("42"),
        EntityKey::competitor("9"),
        EntityKey::SelfAssessment,
    ];

    let summary = scheduler.run(&keys, &CancellationToken::new()).await;

    assert_eq!(summary.initiated, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(cache.len(), 3);
    assert!(cache.cached(&EntityKey::competitor("42")).is_none());
}
