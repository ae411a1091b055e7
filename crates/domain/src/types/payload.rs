//! Completed report payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::job::ReportKind;
use super::overview::MarketOverview;
use crate::errors::{KompeteError, Result};
use crate::utils::normalize::{normalize, CLAIMS_SECTION};

/// Full report artifact in canonical shape
///
/// The only constructor runs the normalizer, so renderers can rely on every
/// known section being absent or an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPayload {
    kind: ReportKind,
    body: Value,
}

impl ReportPayload {
    pub fn new(kind: ReportKind, raw: Value) -> Self {
        Self { kind, body: normalize(raw) }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    pub fn meta(&self) -> Option<&Value> {
        self.body.get("meta")
    }

    /// Array section by key; `None` means "section not available".
    pub fn section(&self, key: &str) -> Option<&[Value]> {
        self.body.get(key).and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Claims audit in grouped form. Records that do not decode are skipped.
    pub fn claims(&self) -> Option<Vec<ClaimGroup>> {
        self.section(CLAIMS_SECTION).map(|items| {
            items.iter().filter_map(|item| serde_json::from_value(item.clone()).ok()).collect()
        })
    }

    /// Decode the review report's market overview.
    ///
    /// # Errors
    /// Returns `KompeteError::InvalidInput` for a feature payload and
    /// `KompeteError::Decode` when the body does not match.
    pub fn market_overview(&self) -> Result<MarketOverview> {
        if self.kind != ReportKind::Review {
            return Err(KompeteError::InvalidInput(format!(
                "{} report has no market overview",
                self.kind
            )));
        }
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Header figures of a feature report.
    pub fn feature_summary(&self) -> Option<FeatureReportSummary> {
        let meta = self.meta()?;
        Some(FeatureReportSummary {
            main_company: meta
                .pointer("/main_company/name")
                .and_then(Value::as_str)
                .map(str::to_owned),
            competitor_count: meta.get("competitors").and_then(Value::as_array).map_or(0, Vec::len),
            features_count: meta.get("main_features_count").and_then(Value::as_u64),
            total_comparisons: meta.get("total_comparisons").and_then(Value::as_u64),
        })
    }
}

/// One claims-audit card: a claim area compared across companies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimGroup {
    #[serde(default)]
    pub claim_area: Option<String>,
    #[serde(default)]
    pub companies: Vec<CompanyClaim>,
    #[serde(default)]
    pub analysis: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyClaim {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub claim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_title: Option<String>,
}

/// "Acme vs 4 competitors • 32 features • 128 comparisons"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureReportSummary {
    pub main_company: Option<String>,
    pub competitor_count: usize,
    pub features_count: Option<u64>,
    pub total_comparisons: Option<u64>,
}
