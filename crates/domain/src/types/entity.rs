//! Per-entity sub-reports (competitor battlecards and the self-assessment)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::CompetitorId;
use crate::constants::{COMPETITOR_TAB_PREFIX, SELF_TAB_KEY};

/// Key of one independently fetchable sub-report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "entity", content = "id")]
pub enum EntityKey {
    Competitor(CompetitorId),
    /// Reserved key for the main company's self-assessment.
    SelfAssessment,
}

impl EntityKey {
    pub fn competitor(id: impl Into<CompetitorId>) -> Self {
        Self::Competitor(id.into())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Competitor(id) => write!(f, "{COMPETITOR_TAB_PREFIX}{id}"),
            Self::SelfAssessment => f.write_str(SELF_TAB_KEY),
        }
    }
}

impl FromStr for EntityKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == SELF_TAB_KEY {
            return Ok(Self::SelfAssessment);
        }
        match s.strip_prefix(COMPETITOR_TAB_PREFIX) {
            Some(id) if !id.is_empty() => Ok(Self::Competitor(CompetitorId::new(id))),
            _ => Err(format!("Invalid entity key: {s}")),
        }
    }
}

/// A fetched battlecard or self-assessment
///
/// The body is kept as returned by the backend; the presentational layer
/// reads the sections it renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubReport {
    pub entity: EntityKey,
    pub fetched_at: DateTime<Utc>,
    pub body: Value,
}

impl SubReport {
    pub fn new(entity: EntityKey, body: Value) -> Self {
        Self { entity, fetched_at: Utc::now(), body }
    }

    /// Computed statistics block (ratings, sentiment, trend).
    pub fn stats(&self) -> Option<&Value> {
        match self.entity {
            EntityKey::Competitor(_) => self.body.pointer("/comp/stats"),
            EntityKey::SelfAssessment => self.body.get("mainCompanyStats"),
        }
    }

    /// Qualitative sections (strengths, pricing, worst reviews, ...).
    pub fn analysis(&self) -> Option<&Value> {
        match self.entity {
            EntityKey::Competitor(_) => self.body.pointer("/comp/battlecard"),
            EntityKey::SelfAssessment => self.body.get("selfAssessment"),
        }
    }
}
