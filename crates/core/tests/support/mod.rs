//! Shared test helpers for `kompete-core` integration tests.
//!
//! A scripted in-memory backend plus report fixtures, so the flow tests can
//! focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod backend;

use std::sync::Arc;
use std::time::Duration;

use kompete_core::{
    ControllerSettings, PollerConfig, ReportGenerationClient, ReportViewController,
};
use kompete_domain::{JobKey, ReportKind};
use serde_json::{json, Value};

pub use backend::{Call, MockBackend};

/// Review payload with three competitors, in prefetch order 7, 42, 9.
pub fn review_payload() -> Value {
    json!({
        "project": { "mainCompany": "Acme" },
        "meta": { "totalReviews": 900 },
        "mainCompanyStats": { "avgRating": 4.5 },
        "competitors": [
            { "id": 7, "name": "Globex", "threat": { "level": "high" } },
            { "id": 42, "name": "Initech", "threat": { "level": "medium" } },
            { "id": 9, "name": "Umbrella", "threat": { "level": "low" } }
        ]
    })
}

pub fn feature_payload() -> Value {
    json!({
        "meta": {
            "main_company": { "name": "Acme" },
            "competitors": [ { "name": "Globex" } ],
            "main_features_count": 12,
            "total_comparisons": 24
        },
        "feature_matrix": { "rows": [ { "feature": "SSO" } ] },
        "claims_audit": [ { "name": "Globex", "claim": "Fastest sync" } ]
    })
}

pub fn settings(prefetch_enabled: bool) -> ControllerSettings {
    ControllerSettings {
        poller: PollerConfig {
            interval: Duration::from_millis(3000),
            max_duration: Duration::from_secs(600),
            max_consecutive_errors: 5,
        },
        prefetch_enabled,
        prefetch_stagger: Duration::from_millis(8000),
    }
}

pub fn controller(
    backend: &Arc<MockBackend>,
    kind: ReportKind,
    prefetch_enabled: bool,
) -> Arc<ReportViewController> {
    let client = Arc::new(ReportGenerationClient::new(backend.clone()));
    ReportViewController::new(
        JobKey::new("p1", kind),
        client,
        backend.clone(),
        settings(prefetch_enabled),
    )
}
