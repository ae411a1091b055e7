//! Application constants
//!
//! Centralized location for domain-level constants used by the report
//! pipeline.

// Status polling
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_POLL_MAX_DURATION_SECS: u64 = 45 * 60;
pub const DEFAULT_POLL_MAX_CONSECUTIVE_ERRORS: u32 = 20;

// Background prefetch, paced to stay under the upstream LLM rate limit
pub const DEFAULT_PREFETCH_STAGGER_MS: u64 = 8000;

// HTTP
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
pub const TENANT_HEADER: &str = "X-Tenant-Id";
pub const USER_HEADER: &str = "X-User-Email";

// Fallback messages
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";
pub const GENERATION_FAILED_MESSAGE: &str = "Report generation failed";
pub const GENERATION_TIMED_OUT_MESSAGE: &str = "Report generation timed out";

// Tabs
pub const OVERVIEW_TAB_TITLE: &str = "Market Overview";
pub const FEATURE_TAB_TITLE: &str = "Feature Report";
pub const OVERVIEW_TAB_KEY: &str = "overview";
pub const SELF_TAB_KEY: &str = "self";
pub const COMPETITOR_TAB_PREFIX: &str = "comp-";
