//! Report generation jobs and their status protocol

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::ids::ProjectId;
use crate::impl_wire_str_conversions;

/// Kind of analytical report a project can generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Review-derived battlecard report (market overview + per-competitor tabs).
    Review,
    /// Feature intelligence report built from product-page comparisons.
    Feature,
}

impl_wire_str_conversions!(ReportKind {
    Review => "review",
    Feature => "feature",
});

impl ReportKind {
    /// Path segment under `/projects/{id}/` for this kind's endpoints.
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::Review => "report",
            Self::Feature => "feature-report",
        }
    }

    /// Only the review report opens on a summary landing screen.
    pub const fn has_landing(&self) -> bool {
        matches!(self, Self::Review)
    }

    /// Whether a generate response body already is this kind's full payload.
    pub fn is_inline_payload(&self, body: &Value) -> bool {
        let marker = match self {
            Self::Review => "competitors",
            Self::Feature => "feature_matrix",
        };
        body.get(marker).is_some_and(|v| !v.is_null())
    }
}

/// Status of a backend generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Idle,
    Generating,
    Classifying,
    Comparing,
    Success,
    Failed,
    /// A status string this client does not know; treated as still running.
    Unknown,
}

impl_wire_str_conversions!(JobStatus {
    Idle => "idle",
    Generating => "generating",
    Classifying => "classifying",
    Comparing => "comparing",
    Success => "success",
    Failed => "failed",
    Unknown => "unknown",
});

impl JobStatus {
    /// `success` and `failed` end polling.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Intermediate stages reported while the backend works.
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Generating | Self::Classifying | Self::Comparing)
    }

    /// User-facing label for the current stage.
    pub const fn progress_label(&self) -> Option<&'static str> {
        match self {
            Self::Classifying => Some("Classifying product pages..."),
            Self::Comparing => Some("Comparing features across competitors..."),
            Self::Generating => Some("Generating report sections..."),
            _ => None,
        }
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(Self::Unknown))
    }
}

/// Identity of one logical job: at most one poll per key is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub project: ProjectId,
    pub kind: ReportKind,
}

impl JobKey {
    pub fn new(project: impl Into<ProjectId>, kind: ReportKind) -> Self {
        Self { project: project.into(), kind }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.kind)
    }
}

/// Body of the status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default, alias = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobStatusResponse {
    pub fn new(status: JobStatus) -> Self {
        Self { status, error_message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { status: JobStatus::Failed, error_message: Some(message.into()) }
    }
}

/// Interpretation of a generate-endpoint response
///
/// The two report kinds answer a cache hit differently: the feature report
/// returns its full payload inline, the review report only a `ready` marker.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateResponse {
    /// A job is running and must be polled.
    Processing(JobStatus),
    /// Cached payload returned inline.
    Inline(Value),
    /// Cached payload exists and must be fetched from the data endpoint.
    ReadyMarker,
    /// Acknowledged without a recognisable status; poll until terminal.
    Accepted,
}

impl GenerateResponse {
    pub fn interpret(kind: ReportKind, body: Value) -> Self {
        let status = body.get("status").and_then(Value::as_str).map(str::to_owned);

        if let Some(status) = status.as_deref().and_then(|s| s.parse::<JobStatus>().ok()) {
            if status.is_processing() {
                return Self::Processing(status);
            }
        }

        if kind.is_inline_payload(&body) {
            return Self::Inline(body);
        }

        match status.as_deref().map(str::to_lowercase).as_deref() {
            Some("ready" | "success") => Self::ReadyMarker,
            _ => Self::Accepted,
        }
    }
}
