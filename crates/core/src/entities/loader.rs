//! Fetches sub-reports through the report backend

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kompete_domain::{
    Competitor, CompetitorId, EntityKey, KompeteError, ProjectId, Result, SubReport,
};
use parking_lot::RwLock;
use tracing::instrument;

use super::EntityFetcher;
use crate::report::ports::SubReportSource;

/// [`EntityFetcher`] for one project's battlecards and self-assessment
///
/// Battlecard requests echo the competitor's threat assessment from the
/// market overview, so the roster must be set before competitors are fetched.
pub struct SubReportLoader {
    project: ProjectId,
    source: Arc<dyn SubReportSource>,
    roster: RwLock<HashMap<CompetitorId, Competitor>>,
}

impl SubReportLoader {
    pub fn new(project: ProjectId, source: Arc<dyn SubReportSource>) -> Self {
        Self { project, source, roster: RwLock::new(HashMap::new()) }
    }

    /// Replace the known competitors.
    pub fn set_roster(&self, competitors: &[Competitor]) {
        let roster = competitors.iter().map(|c| (c.id.clone(), c.clone())).collect();
        *self.roster.write() = roster;
    }

    pub fn competitor(&self, id: &CompetitorId) -> Option<Competitor> {
        self.roster.read().get(id).cloned()
    }
}

#[async_trait]
impl EntityFetcher for SubReportLoader {
    #[instrument(skip(self), fields(project = %self.project, entity = %key))]
    async fn fetch(&self, key: &EntityKey, refresh: bool) -> Result<SubReport> {
        let body = match key {
            EntityKey::Competitor(id) => {
                let competitor = self.competitor(id).ok_or_else(|| {
                    KompeteError::NotFound(format!("competitor {id} is not part of this report"))
                })?;
                self.source.battlecard(&self.project, &competitor, refresh).await?
            }
            EntityKey::SelfAssessment => self.source.self_assessment(&self.project, refresh).await?,
        };
        Ok(SubReport::new(key.clone(), body))
    }
}
