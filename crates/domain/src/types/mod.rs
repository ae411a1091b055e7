//! Domain types and models
//!
//! Everything that crosses the backend boundary is defined here so that core
//! and infra agree on a single shape.

pub mod entity;
pub mod ids;
pub mod job;
pub mod overview;
pub mod payload;
pub mod version;
mod wire;

pub use entity::{EntityKey, SubReport};
pub use ids::{CompetitorId, ProjectId, VersionId};
pub use job::{GenerateResponse, JobKey, JobStatus, JobStatusResponse, ReportKind};
pub use overview::{
    CompanyStats, Competitor, LandingSummary, MarketOverview, OverviewMeta, ProjectSummary,
};
pub use payload::{ClaimGroup, CompanyClaim, FeatureReportSummary, ReportPayload};
pub use version::ReportVersion;
