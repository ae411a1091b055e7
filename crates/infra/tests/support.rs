#![allow(dead_code)]

use std::sync::Arc;

use kompete_infra::{ApiClient, ApiClientConfig, HttpReportBackend, Session, SessionStore};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TENANT: &str = "tenant-9";
pub const EMAIL: &str = "ana@example.com";

/// Backend adapter pointed at `server`, signed in as [`TENANT`]/[`EMAIL`].
pub fn backend_for(server: &MockServer) -> (Arc<HttpReportBackend>, Arc<SessionStore>) {
    let session = Arc::new(SessionStore::new());
    session.sign_in(Session::new(TENANT, EMAIL));

    let config = ApiClientConfig { base_url: format!("{}/api", server.uri()), ..Default::default() };
    let client = ApiClient::builder()
        .config(config)
        .session(Arc::clone(&session))
        .build()
        .expect("api client should build");

    (Arc::new(HttpReportBackend::new(Arc::new(client))), session)
}

pub fn review_payload() -> Value {
    json!({
        "project": { "mainCompany": "Acme" },
        "meta": { "totalReviews": 900 },
        "mainCompanyStats": { "avgRating": 4.5 },
        "competitors": [
            { "id": 7, "name": "Globex", "threat": { "level": "high" } },
            { "id": 42, "name": "Initech", "threat": { "level": "medium" } }
        ]
    })
}

pub fn feature_payload() -> Value {
    json!({
        "meta": {
            "main_company": { "name": "Acme" },
            "competitors": [ { "name": "Globex" } ]
        },
        "feature_matrix": { "rows": [ { "feature": "SSO" } ] },
        "claims_audit": [ { "name": "Globex", "claim": "Fastest sync" } ]
    })
}
