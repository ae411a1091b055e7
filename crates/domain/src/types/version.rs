//! Historical report generations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::VersionId;
use super::job::JobStatus;

/// One historical generation record; exactly one version is active server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    pub id: VersionId,
    #[serde(default, alias = "createdAt", alias = "generated_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    pub status: JobStatus,
    #[serde(default, alias = "isActive", alias = "active")]
    pub is_active: bool,
}

fn default_status() -> JobStatus {
    JobStatus::Success
}
