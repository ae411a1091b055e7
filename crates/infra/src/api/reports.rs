//! HTTP implementation of the report ports

use std::sync::Arc;

use async_trait::async_trait;
use kompete_core::{ReportBackend, SubReportSource};
use kompete_domain::{
    Competitor, GenerateResponse, JobKey, JobStatusResponse, ProjectId, ReportVersion, Result,
    VersionId,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;
use urlencoding::encode;

use super::client::ApiClient;

/// Versions arrive as a bare list or wrapped in `{ "versions": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionsBody {
    List(Vec<ReportVersion>),
    Wrapped { versions: Vec<ReportVersion> },
}

impl From<VersionsBody> for Vec<ReportVersion> {
    fn from(body: VersionsBody) -> Self {
        match body {
            VersionsBody::List(versions) | VersionsBody::Wrapped { versions } => versions,
        }
    }
}

/// Report generation and sub-report endpoints of the Kompete backend
pub struct HttpReportBackend {
    client: Arc<ApiClient>,
}

impl HttpReportBackend {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    fn report_path(key: &JobKey, action: &str) -> String {
        format!("/projects/{}/{}/{}", encode(key.project.as_str()), key.kind.path_segment(), action)
    }
}

fn with_refresh(path: String, refresh: bool) -> String {
    if refresh {
        format!("{path}?refresh=true")
    } else {
        path
    }
}

#[async_trait]
impl ReportBackend for HttpReportBackend {
    #[instrument(skip(self), fields(job = %key))]
    async fn generate(&self, key: &JobKey, refresh: bool) -> Result<GenerateResponse> {
        let path = with_refresh(Self::report_path(key, "generate"), refresh);
        let body: Value = self.client.post_empty(&path).await?;
        Ok(GenerateResponse::interpret(key.kind, body))
    }

    #[instrument(skip(self), fields(job = %key))]
    async fn status(&self, key: &JobKey) -> Result<JobStatusResponse> {
        Ok(self.client.get(&Self::report_path(key, "status")).await?)
    }

    #[instrument(skip(self), fields(job = %key))]
    async fn data(&self, key: &JobKey) -> Result<Value> {
        Ok(self.client.get(&Self::report_path(key, "data")).await?)
    }

    #[instrument(skip(self), fields(job = %key))]
    async fn versions(&self, key: &JobKey) -> Result<Vec<ReportVersion>> {
        let body: VersionsBody = self.client.get(&Self::report_path(key, "versions")).await?;
        Ok(body.into())
    }

    #[instrument(skip(self), fields(job = %key, version = %version))]
    async fn activate_version(&self, key: &JobKey, version: &VersionId) -> Result<()> {
        let action = format!("versions/{}/activate", encode(version.as_str()));
        let _: Value = self.client.post_empty(&Self::report_path(key, &action)).await?;
        Ok(())
    }
}

#[async_trait]
impl SubReportSource for HttpReportBackend {
    #[instrument(skip(self, competitor), fields(project = %project, competitor = %competitor.id))]
    async fn battlecard(
        &self,
        project: &ProjectId,
        competitor: &Competitor,
        refresh: bool,
    ) -> Result<Value> {
        let path = with_refresh(
            format!(
                "/projects/{}/battlecard/{}.json",
                encode(project.as_str()),
                encode(competitor.id.as_str())
            ),
            refresh,
        );
        Ok(self.client.post(&path, &json!({ "threatData": competitor.threat })).await?)
    }

    #[instrument(skip(self), fields(project = %project))]
    async fn self_assessment(&self, project: &ProjectId, refresh: bool) -> Result<Value> {
        let path = with_refresh(
            format!("/projects/{}/self-assessment.json", encode(project.as_str())),
            refresh,
        );
        Ok(self.client.get(&path).await?)
    }
}
