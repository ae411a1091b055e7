//! Report page state machine
//!
//! Binds the generation client, status poller, and per-entity cache to the
//! states a report page shows. Every background task belongs to the
//! controller and is cancelled by [`ReportViewController::teardown`]; after
//! teardown no further state is published.

use std::sync::Arc;
use std::time::Duration;

use kompete_domain::constants::{
    DEFAULT_PREFETCH_STAGGER_MS, FEATURE_TAB_TITLE, GENERATION_TIMED_OUT_MESSAGE,
    OVERVIEW_TAB_TITLE,
};
use kompete_domain::{
    Config, EntityKey, JobKey, KompeteError, MarketOverview, ReportKind, ReportPayload,
    ReportVersion, Result, SubReport, VersionId,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::{GenerateOutcome, ReportGenerationClient};
use super::ports::SubReportSource;
use super::state::{RegenerateScope, ReportTab, TabContent, TabDescriptor, ViewState};
use crate::entities::{EntityReportCache, Lookup, PrefetchScheduler, SubReportLoader};
use crate::polling::{PollOutcome, PollerConfig, StatusPoller, TaskRegistry};

/// Tunables of a report page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub poller: PollerConfig,
    pub prefetch_enabled: bool,
    pub prefetch_stagger: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            prefetch_enabled: true,
            prefetch_stagger: Duration::from_millis(DEFAULT_PREFETCH_STAGGER_MS),
        }
    }
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            poller: PollerConfig::from(&config.polling),
            prefetch_enabled: config.prefetch.enabled,
            prefetch_stagger: Duration::from_millis(config.prefetch.stagger_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    /// First load of the page; served from the backend cache when possible.
    Initial,
    /// Full regeneration of the report.
    Regenerate,
    /// Reload after switching the active version.
    VersionSwitch,
}

impl LoadMode {
    fn refresh(self) -> bool {
        matches!(self, Self::Regenerate)
    }

    fn restarts_prefetch(self) -> bool {
        !matches!(self, Self::Initial)
    }
}

#[derive(Debug)]
struct PageState {
    payload: Option<ReportPayload>,
    overview: Option<MarketOverview>,
    active_tab: ReportTab,
    /// The landing splash was dismissed.
    entered: bool,
}

/// Controller of one report page for one job
pub struct ReportViewController {
    key: JobKey,
    client: Arc<ReportGenerationClient>,
    loader: Arc<SubReportLoader>,
    entities: Arc<EntityReportCache>,
    prefetch: PrefetchScheduler,
    poller: StatusPoller,
    prefetch_enabled: bool,
    jobs: TaskRegistry<JobKey>,
    page: Mutex<PageState>,
    state: watch::Sender<ViewState>,
    teardown: CancellationToken,
}

impl ReportViewController {
    pub fn new(
        key: JobKey,
        client: Arc<ReportGenerationClient>,
        source: Arc<dyn SubReportSource>,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        let loader = Arc::new(SubReportLoader::new(key.project.clone(), source));
        let entities = Arc::new(EntityReportCache::new(loader.clone()));
        let prefetch = PrefetchScheduler::new(Arc::clone(&entities), settings.prefetch_stagger);
        let (state, _) = watch::channel(ViewState::Loading);

        Arc::new(Self {
            key,
            client,
            loader,
            entities,
            prefetch,
            poller: StatusPoller::new(settings.poller),
            prefetch_enabled: settings.prefetch_enabled,
            jobs: TaskRegistry::new(),
            page: Mutex::new(PageState {
                payload: None,
                overview: None,
                active_tab: ReportTab::Overview,
                entered: false,
            }),
            state,
            teardown: CancellationToken::new(),
        })
    }

    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// Start loading in the background.
    pub fn mount(self: &Arc<Self>) {
        info!(job = %self.key, "mounting report page");
        self.spawn_load(LoadMode::Initial);
    }

    /// Load the report and wait for the resulting state.
    ///
    /// A concurrent load for the same job is replaced; the returned state is
    /// whatever the page shows once the latest load settles.
    pub async fn load(self: &Arc<Self>) -> ViewState {
        self.reload(LoadMode::Initial).await
    }

    /// Dismiss the landing splash. Returns whether the page was on it.
    pub fn enter(&self) -> bool {
        let active_tab = {
            let mut page = self.page.lock();
            page.entered = true;
            page.active_tab.clone()
        };
        if matches!(self.state(), ViewState::Landing(_)) {
            self.publish(ViewState::Ready { active_tab });
            true
        } else {
            false
        }
    }

    /// Tab strip for the loaded report.
    pub fn tabs(&self) -> Vec<TabDescriptor> {
        let page = self.page.lock();
        let overview_title = match self.key.kind {
            ReportKind::Review => OVERVIEW_TAB_TITLE,
            ReportKind::Feature => FEATURE_TAB_TITLE,
        };
        let mut tabs =
            vec![TabDescriptor { tab: ReportTab::Overview, title: overview_title.to_string() }];

        if let Some(overview) = &page.overview {
            tabs.extend(overview.competitors.iter().map(|competitor| TabDescriptor {
                tab: ReportTab::Entity(EntityKey::Competitor(competitor.id.clone())),
                title: competitor.name.clone(),
            }));
            tabs.push(TabDescriptor {
                tab: ReportTab::Entity(EntityKey::SelfAssessment),
                title: overview.project.main_company.clone(),
            });
        }
        tabs
    }

    pub fn active_tab(&self) -> ReportTab {
        self.page.lock().active_tab.clone()
    }

    /// Activate `tab` without waiting. An uncached entity tab starts its
    /// fetch (or joins the one in flight) and reports `Loading`.
    pub fn select_tab(&self, tab: ReportTab) -> TabContent {
        self.page.lock().active_tab = tab.clone();
        if self.state().is_ready() {
            self.publish(ViewState::Ready { active_tab: tab.clone() });
        }

        match &tab {
            ReportTab::Overview => self.overview_content(),
            ReportTab::Entity(key) => match self.entities.get(key) {
                Lookup::Ready(report) => TabContent::Loaded(report),
                Lookup::Pending(_) => TabContent::Loading,
            },
        }
    }

    /// Activate `tab` and wait for its content.
    pub async fn open_tab(&self, tab: ReportTab) -> TabContent {
        let content = self.select_tab(tab.clone());
        let Some(key) = tab.entity() else {
            return content;
        };
        if !matches!(content, TabContent::Loading) {
            return content;
        }

        let loaded = tokio::select! {
            _ = self.teardown.cancelled() => return TabContent::Loading,
            loaded = self.entities.load(key) => loaded,
        };
        self.tab_content(loaded)
    }

    /// Regenerate whatever the active tab shows.
    ///
    /// The overview triggers a full regeneration; a competitor or the
    /// self-assessment refreshes only that sub-report.
    pub async fn regenerate(self: &Arc<Self>) -> TabContent {
        let scope = RegenerateScope::from(&self.active_tab());
        info!(job = %self.key, ?scope, "regenerate requested");

        match scope {
            RegenerateScope::Report => {
                self.reload(LoadMode::Regenerate).await;
                self.overview_content()
            }
            RegenerateScope::Entity(key) => {
                let refreshed = tokio::select! {
                    _ = self.teardown.cancelled() => return TabContent::Loading,
                    refreshed = self.entities.refresh(&key) => refreshed,
                };
                self.tab_content(refreshed)
            }
        }
    }

    pub async fn versions(&self) -> Result<Vec<ReportVersion>> {
        self.client.versions(&self.key).await.inspect_err(|err| self.on_request_error(err))
    }

    /// Switch the active version and reload the page from it.
    pub async fn activate_version(self: &Arc<Self>, version: &VersionId) -> Result<ViewState> {
        self.client
            .activate_version(&self.key, version)
            .await
            .inspect_err(|err| self.on_request_error(err))?;
        Ok(self.reload(LoadMode::VersionSwitch).await)
    }

    /// Report currently shown on the overview.
    pub fn payload(&self) -> Option<ReportPayload> {
        self.page.lock().payload.clone()
    }

    pub fn overview(&self) -> Option<MarketOverview> {
        self.page.lock().overview.clone()
    }

    pub fn entities(&self) -> &Arc<EntityReportCache> {
        &self.entities
    }

    pub fn prefetch(&self) -> &PrefetchScheduler {
        &self.prefetch
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Cancel every timer and fetch owned by the page.
    pub fn teardown(&self) {
        if self.teardown.is_cancelled() {
            return;
        }
        info!(job = %self.key, "tearing down report page");
        self.teardown.cancel();
        self.jobs.stop_all();
        self.prefetch.shutdown();
        self.entities.clear();
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_cancelled()
    }

    fn spawn_load(self: &Arc<Self>, mode: LoadMode) {
        let this = Arc::clone(self);
        self.jobs.start(self.key.clone(), move |token| async move {
            this.run_load(mode, &token).await;
        });
    }

    async fn reload(self: &Arc<Self>, mode: LoadMode) -> ViewState {
        self.spawn_load(mode);
        self.jobs.join(&self.key).await;
        self.state()
    }

    async fn run_load(&self, mode: LoadMode, cancel: &CancellationToken) {
        self.publish(ViewState::Loading);

        let generated = tokio::select! {
            _ = cancel.cancelled() => return,
            generated = self.client.generate(&self.key, mode.refresh()) => generated,
        };

        let payload = match generated {
            Ok(GenerateOutcome::Ready(payload)) => payload,
            Ok(GenerateOutcome::Processing(status)) => {
                info!(job = %self.key, %status, "report generation in progress");
                self.publish(ViewState::generating(status));
                let outcome = self
                    .poller
                    .poll(
                        || self.client.status(&self.key),
                        || self.client.data(&self.key),
                        |status| {
                            if !status.is_terminal() {
                                self.publish(ViewState::generating(status));
                            }
                        },
                        cancel,
                    )
                    .await;

                match outcome {
                    PollOutcome::Succeeded(payload) => payload,
                    PollOutcome::Failed(message) => {
                        warn!(job = %self.key, %message, "report generation failed");
                        return self.publish(ViewState::error(message));
                    }
                    PollOutcome::TimedOut => {
                        return self.publish(ViewState::error(GENERATION_TIMED_OUT_MESSAGE));
                    }
                    PollOutcome::Unreachable { last_error } => return self.fail(&last_error),
                    PollOutcome::Errored(err) => return self.fail(&err),
                    PollOutcome::Cancelled => return,
                }
            }
            Err(err) => return self.fail(&err),
        };

        if cancel.is_cancelled() {
            return;
        }
        self.apply_payload(payload, mode);
    }

    fn apply_payload(&self, payload: ReportPayload, mode: LoadMode) {
        let overview = match self.key.kind {
            ReportKind::Review => payload
                .market_overview()
                .inspect_err(|err| warn!(job = %self.key, error = %err, "market overview did not decode"))
                .ok(),
            ReportKind::Feature => None,
        };
        if let Some(overview) = &overview {
            self.loader.set_roster(&overview.competitors);
        }

        let next = {
            let mut page = self.page.lock();
            page.payload = Some(payload);
            page.overview = overview.clone();
            match &overview {
                Some(overview) if self.key.kind.has_landing() && !page.entered => {
                    ViewState::Landing(overview.landing_summary())
                }
                _ => ViewState::Ready { active_tab: page.active_tab.clone() },
            }
        };
        info!(job = %self.key, ?mode, "report ready");
        self.publish(next);

        let Some(overview) = overview.filter(|_| self.prefetch_enabled) else {
            return;
        };
        if mode.restarts_prefetch() {
            self.entities.clear();
            self.prefetch.restart(overview.entity_keys());
        } else {
            self.prefetch.start(overview.entity_keys());
        }
    }

    fn overview_content(&self) -> TabContent {
        if let Some(payload) = self.payload() {
            return TabContent::Overview(payload);
        }
        match self.state() {
            ViewState::Error { message } => TabContent::Failed { message },
            _ => TabContent::Loading,
        }
    }

    fn tab_content(&self, loaded: Result<SubReport>) -> TabContent {
        match loaded {
            Ok(report) => TabContent::Loaded(report),
            Err(KompeteError::Cancelled) => TabContent::Loading,
            Err(err) => {
                self.on_request_error(&err);
                TabContent::Failed { message: err.to_string() }
            }
        }
    }

    /// Whole-report failure.
    fn fail(&self, err: &KompeteError) {
        if err.is_auth() {
            self.publish(ViewState::SignedOut);
        } else {
            warn!(job = %self.key, error = %err, kind = err.label(), "report failed to load");
            self.publish(ViewState::error(err.to_string()));
        }
    }

    /// Failures outside the page load only escalate for authentication.
    fn on_request_error(&self, err: &KompeteError) {
        if err.is_auth() {
            self.publish(ViewState::SignedOut);
        }
    }

    fn publish(&self, next: ViewState) {
        if self.teardown.is_cancelled() {
            debug!(job = %self.key, ?next, "ignoring state change after teardown");
            return;
        }
        debug!(job = %self.key, state = ?next, "view state");
        self.state.send_replace(next);
    }
}

impl Drop for ReportViewController {
    fn drop(&mut self) {
        self.teardown.cancel();
    }
}
