use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use kompete_core::{ReportBackend, SubReportSource};
use kompete_domain::{
    Competitor, GenerateResponse, JobKey, JobStatus, JobStatusResponse, KompeteError, ProjectId,
    ReportVersion, Result as DomainResult, VersionId,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::time::Instant;

/// One recorded backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Generate { refresh: bool },
    Status,
    Data,
    Versions,
    Activate(String),
    Battlecard { competitor: String, refresh: bool },
    SelfAssessment { refresh: bool },
}

/// Scripted backend for both report ports.
///
/// `generate` answers with the scripted responses in order and repeats the
/// last one; status checks pop the scripted statuses and fall back to
/// `generating`. Sub-report fetches take `sub_report_delay` to answer.
pub struct MockBackend {
    generate: Mutex<VecDeque<DomainResult<GenerateResponse>>>,
    statuses: Mutex<VecDeque<DomainResult<JobStatusResponse>>>,
    data: Value,
    sub_report_delay: Duration,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(Call, Instant)>>,
}

impl MockBackend {
    pub fn new(data: Value) -> Self {
        Self {
            generate: Mutex::new(VecDeque::from([Ok(GenerateResponse::ReadyMarker)])),
            statuses: Mutex::new(VecDeque::new()),
            data,
            sub_report_delay: Duration::from_millis(500),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_generate(self, responses: Vec<DomainResult<GenerateResponse>>) -> Self {
        *self.generate.lock() = responses.into();
        self
    }

    pub fn with_statuses(self, statuses: &[&str]) -> Self {
        let scripted = statuses
            .iter()
            .map(|s| Ok(JobStatusResponse::new(s.parse().unwrap_or(JobStatus::Unknown))))
            .collect();
        *self.statuses.lock() = scripted;
        self
    }

    pub fn with_status_responses(self, responses: Vec<DomainResult<JobStatusResponse>>) -> Self {
        *self.statuses.lock() = responses.into();
        self
    }

    pub fn with_sub_report_delay(mut self, delay: Duration) -> Self {
        self.sub_report_delay = delay;
        self
    }

    /// Make one entity (`comp-<id>` or `self`) fail with a backend error.
    pub fn failing(self, entity: &str) -> Self {
        self.failing.lock().insert(entity.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(call, _)| call.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|(call, _)| predicate(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push((call, Instant::now()));
    }

    async fn sub_report(&self, entity: String, body: Value) -> DomainResult<Value> {
        tokio::time::sleep(self.sub_report_delay).await;
        if self.failing.lock().contains(&entity) {
            return Err(KompeteError::Backend("Battlecard generation failed".into()));
        }
        Ok(body)
    }
}

#[async_trait]
impl ReportBackend for MockBackend {
    async fn generate(&self, _key: &JobKey, refresh: bool) -> DomainResult<GenerateResponse> {
        self.record(Call::Generate { refresh });
        let mut scripted = self.generate.lock();
        if scripted.len() > 1 {
            scripted.pop_front().unwrap_or(Ok(GenerateResponse::ReadyMarker))
        } else {
            scripted.front().cloned().unwrap_or(Ok(GenerateResponse::ReadyMarker))
        }
    }

    async fn status(&self, _key: &JobKey) -> DomainResult<JobStatusResponse> {
        self.record(Call::Status);
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(JobStatusResponse::new(JobStatus::Generating)))
    }

    async fn data(&self, _key: &JobKey) -> DomainResult<Value> {
        self.record(Call::Data);
        Ok(self.data.clone())
    }

    async fn versions(&self, _key: &JobKey) -> DomainResult<Vec<ReportVersion>> {
        self.record(Call::Versions);
        Ok(serde_json::from_value(json!([
            { "id": 2, "createdAt": "2026-03-01T09:00:00Z", "status": "success", "isActive": true },
            { "id": 1, "createdAt": "2026-02-01T09:00:00Z", "status": "success", "isActive": false }
        ]))?)
    }

    async fn activate_version(&self, _key: &JobKey, version: &VersionId) -> DomainResult<()> {
        self.record(Call::Activate(version.to_string()));
        Ok(())
    }
}

#[async_trait]
impl SubReportSource for MockBackend {
    async fn battlecard(
        &self,
        _project: &ProjectId,
        competitor: &Competitor,
        refresh: bool,
    ) -> DomainResult<Value> {
        self.record(Call::Battlecard { competitor: competitor.id.to_string(), refresh });
        let body = json!({
            "comp": {
                "name": competitor.name,
                "stats": { "avgRating": 3.8 },
                "battlecard": { "threat": competitor.threat, "refresh": refresh }
            }
        });
        self.sub_report(format!("comp-{}", competitor.id), body).await
    }

    async fn self_assessment(&self, _project: &ProjectId, refresh: bool) -> DomainResult<Value> {
        self.record(Call::SelfAssessment { refresh });
        let body = json!({
            "mainCompanyStats": { "avgRating": 4.5 },
            "selfAssessment": { "refresh": refresh }
        });
        self.sub_report("self".to_string(), body).await
    }
}
