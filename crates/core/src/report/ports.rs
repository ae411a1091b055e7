//! Port interfaces for the report backend

use async_trait::async_trait;
use kompete_domain::{
    Competitor, GenerateResponse, JobKey, JobStatusResponse, ProjectId, ReportVersion, Result,
    VersionId,
};
use serde_json::Value;

/// Trait for the generate → status → data protocol of one report kind
#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Request generation, or retrieval of the cached report
    async fn generate(&self, key: &JobKey, refresh: bool) -> Result<GenerateResponse>;

    /// Current job status
    async fn status(&self, key: &JobKey) -> Result<JobStatusResponse>;

    /// Raw payload of the completed job
    async fn data(&self, key: &JobKey) -> Result<Value>;

    /// Historical generations, newest first as returned by the backend
    async fn versions(&self, key: &JobKey) -> Result<Vec<ReportVersion>>;

    /// Make `version` the current report server-side
    async fn activate_version(&self, key: &JobKey, version: &VersionId) -> Result<()>;
}

/// Trait for fetching per-entity sub-reports
#[async_trait]
pub trait SubReportSource: Send + Sync {
    /// Battlecard for one competitor; the competitor's threat context is sent along
    async fn battlecard(
        &self,
        project: &ProjectId,
        competitor: &Competitor,
        refresh: bool,
    ) -> Result<Value>;

    /// The main company's self-assessment
    async fn self_assessment(&self, project: &ProjectId, refresh: bool) -> Result<Value>;
}
