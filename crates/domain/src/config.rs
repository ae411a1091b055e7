//! Configuration structures
//!
//! Loaded by `kompete-infra::config` from environment variables or a JSON/TOML
//! file. Every section has defaults, so a file only needs the values it
//! overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_POLL_MAX_CONSECUTIVE_ERRORS, DEFAULT_POLL_MAX_DURATION_SECS,
    DEFAULT_PREFETCH_STAGGER_MS,
};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub polling: PollingConfig,
    pub prefetch: PrefetchConfig,
    pub logging: LoggingConfig,
}

/// Backend API connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tenant scope and caller identity attached to every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tenant_id: Option<String>,
    pub user_email: Option<String>,
}

/// Status polling cadence and ceilings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_duration_secs: u64,
    pub max_consecutive_errors: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_duration_secs: DEFAULT_POLL_MAX_DURATION_SECS,
            max_consecutive_errors: DEFAULT_POLL_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

/// Background sub-report prefetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    pub enabled: bool,
    pub stagger_ms: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self { enabled: true, stagger_ms: DEFAULT_PREFETCH_STAGGER_MS }
    }
}

/// Tracing output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `kompete_core=debug,info`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
