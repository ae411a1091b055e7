//! Example: Opening a report page against a running backend
//!
//! Loads configuration (environment, `.env`, or a `kompete.toml`), generates
//! or fetches the report, follows its progress, then walks every tab.
//!
//! # Setup
//!
//! 1. Start the backend (defaults to `http://localhost:3001/api`)
//!
//! 2. Set the caller identity: ```bash export KOMPETE_TENANT_ID=tenant-1
//!    export KOMPETE_USER_EMAIL=ana@example.com ```
//!
//! 3. Run this example: ```bash cargo run -p kompete-infra --example
//!    report_session -- <project-id> [review|feature] ```

use std::sync::Arc;

use kompete_core::{
    ControllerSettings, ReportGenerationClient, ReportViewController, TabContent, ViewState,
};
use kompete_domain::{JobKey, ReportKind};
use kompete_infra::{
    config, init_tracing, ApiClient, ApiClientConfig, HttpReportBackend, SessionStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let project = args.next().ok_or("usage: report_session <project-id> [review|feature]")?;
    let kind: ReportKind = args.next().as_deref().unwrap_or("review").parse()?;

    let config = config::load().unwrap_or_default();
    init_tracing(&config.logging)?;

    let session = Arc::new(SessionStore::from_config(&config.session));
    let api = ApiClient::builder()
        .config(ApiClientConfig::from(&config.api))
        .session(Arc::clone(&session))
        .build()?;
    let backend = Arc::new(HttpReportBackend::new(Arc::new(api)));

    let page = ReportViewController::new(
        JobKey::new(project, kind),
        Arc::new(ReportGenerationClient::new(backend.clone())),
        backend,
        ControllerSettings::from(&config),
    );

    let mut states = page.subscribe();
    let progress = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            if let ViewState::Generating { label: Some(label), .. } = &*states.borrow_and_update() {
                println!("  {label}");
            }
        }
    });

    match page.load().await {
        ViewState::Landing(summary) => {
            println!(
                "{}: {} competitors, {} reviews analysed",
                summary.main_company,
                summary.competitor_count,
                summary.total_reviews.unwrap_or(0)
            );
            page.enter();
        }
        ViewState::Ready { .. } => {}
        ViewState::SignedOut => {
            println!("Session rejected by the backend; set KOMPETE_TENANT_ID/KOMPETE_USER_EMAIL");
            return Ok(());
        }
        ViewState::Error { message } => {
            println!("Report failed: {message}");
            return Ok(());
        }
        other => println!("Unexpected state: {other:?}"),
    }

    for descriptor in page.tabs() {
        let outcome = match page.open_tab(descriptor.tab.clone()).await {
            TabContent::Overview(_) | TabContent::Loaded(_) => "ready".to_string(),
            TabContent::Loading => "still loading".to_string(),
            TabContent::Failed { message } => format!("failed: {message}"),
        };
        println!("[{}] {}: {}", descriptor.tab, descriptor.title, outcome);
    }

    page.teardown();
    progress.abort();
    Ok(())
}
