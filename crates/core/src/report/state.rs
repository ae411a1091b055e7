//! User-visible states of a report page

use std::fmt;
use std::str::FromStr;

use kompete_domain::constants::OVERVIEW_TAB_KEY;
use kompete_domain::{EntityKey, JobStatus, LandingSummary, ReportPayload, SubReport};

/// Page-level state
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Initial request outstanding.
    Loading,
    /// A backend job is running.
    Generating { status: JobStatus, label: Option<&'static str> },
    /// Summary splash shown before the tabs (review report only).
    Landing(LandingSummary),
    Ready { active_tab: ReportTab },
    /// Terminal for this attempt; the user retries or leaves.
    Error { message: String },
    /// The backend rejected the session.
    SignedOut,
}

impl ViewState {
    pub fn generating(status: JobStatus) -> Self {
        Self::Generating { status, label: status.progress_label() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Tab of a report page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportTab {
    Overview,
    Entity(EntityKey),
}

impl ReportTab {
    pub fn entity(&self) -> Option<&EntityKey> {
        match self {
            Self::Overview => None,
            Self::Entity(key) => Some(key),
        }
    }
}

impl From<EntityKey> for ReportTab {
    fn from(key: EntityKey) -> Self {
        Self::Entity(key)
    }
}

impl fmt::Display for ReportTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overview => f.write_str(OVERVIEW_TAB_KEY),
            Self::Entity(key) => key.fmt(f),
        }
    }
}

impl FromStr for ReportTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == OVERVIEW_TAB_KEY {
            return Ok(Self::Overview);
        }
        s.parse::<EntityKey>().map(Self::Entity).map_err(|_| format!("Invalid report tab: {s}"))
    }
}

/// Tab header shown in the tab strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabDescriptor {
    pub tab: ReportTab,
    pub title: String,
}

/// What the active tab can show right now
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Overview(ReportPayload),
    Loaded(SubReport),
    Loading,
    /// Per-tab failure; never escalates to the page.
    Failed { message: String },
}

/// What a regenerate action refreshes, decided by the active tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateScope {
    /// Full report regeneration.
    Report,
    Entity(EntityKey),
}

impl From<&ReportTab> for RegenerateScope {
    fn from(tab: &ReportTab) -> Self {
        match tab {
            ReportTab::Overview => Self::Report,
            ReportTab::Entity(key) => Self::Entity(key.clone()),
        }
    }
}
