//! Review-report market overview

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::EntityKey;
use super::ids::CompetitorId;
use super::wire::{default_on_null, lenient_f64, lenient_u64, skip_invalid};

/// Market overview body of a review report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    #[serde(default, deserialize_with = "default_on_null")]
    pub project: ProjectSummary,
    #[serde(default, deserialize_with = "default_on_null")]
    pub meta: OverviewMeta,
    #[serde(default, deserialize_with = "default_on_null")]
    pub main_company_stats: CompanyStats,
    /// Rows without a usable `id` are dropped.
    #[serde(default, deserialize_with = "skip_invalid")]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(default, deserialize_with = "default_on_null")]
    pub main_company: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMeta {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_reviews: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_rating: Option<f64>,
}

/// Competitor row; `threat` is echoed back when requesting its battlecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    #[serde(default, deserialize_with = "default_on_null")]
    pub name: String,
    #[serde(default)]
    pub threat: Value,
}

impl MarketOverview {
    /// Sub-report keys in prefetch order: competitors as listed, then self.
    pub fn entity_keys(&self) -> Vec<EntityKey> {
        self.competitors
            .iter()
            .map(|c| EntityKey::Competitor(c.id.clone()))
            .chain(std::iter::once(EntityKey::SelfAssessment))
            .collect()
    }

    pub fn competitor(&self, id: &CompetitorId) -> Option<&Competitor> {
        self.competitors.iter().find(|c| &c.id == id)
    }

    pub fn landing_summary(&self) -> LandingSummary {
        LandingSummary {
            main_company: self.project.main_company.clone(),
            competitor_count: self.competitors.len(),
            total_reviews: self.meta.total_reviews,
            main_company_rating: self.main_company_stats.avg_rating,
        }
    }
}

/// Figures shown on the review report's landing splash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingSummary {
    pub main_company: String,
    pub competitor_count: usize,
    pub total_reviews: Option<u64>,
    pub main_company_rating: Option<f64>,
}
