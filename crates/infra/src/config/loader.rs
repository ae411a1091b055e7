//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the process environment when one exists
//! 2. Attempts to load from environment variables
//! 3. If `KOMPETE_API_URL` is missing, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `KOMPETE_API_URL`: Backend base URL (required for env loading)
//! - `KOMPETE_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `KOMPETE_TENANT_ID`: Tenant scope header value
//! - `KOMPETE_USER_EMAIL`: Caller identity header value
//! - `KOMPETE_POLL_INTERVAL_MS`: Status poll interval
//! - `KOMPETE_POLL_MAX_DURATION_SECS`: Give up polling after this long
//! - `KOMPETE_POLL_MAX_ERRORS`: Consecutive failed status checks tolerated
//! - `KOMPETE_PREFETCH_ENABLED`: Background sub-report prefetch (true/false)
//! - `KOMPETE_PREFETCH_STAGGER_MS`: Gap between prefetch initiations
//! - `KOMPETE_LOG_LEVEL`: `EnvFilter` directive
//! - `KOMPETE_LOG_JSON`: JSON log output (true/false)
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./kompete.json` or `./kompete.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use kompete_domain::{Config, KompeteError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables (after reading any
/// `.env` file). If `KOMPETE_API_URL` is missing, falls back to loading from
/// a config file.
///
/// # Errors
/// Returns `KompeteError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A variable holds an unparseable value
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `KOMPETE_API_URL` must be present; every other variable is optional.
///
/// # Errors
/// Returns `KompeteError::Config` if `KOMPETE_API_URL` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("KOMPETE_API_URL")?;
    if let Some(timeout) = env_parse("KOMPETE_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }

    config.session.tenant_id = env_opt("KOMPETE_TENANT_ID");
    config.session.user_email = env_opt("KOMPETE_USER_EMAIL");

    if let Some(interval) = env_parse("KOMPETE_POLL_INTERVAL_MS")? {
        config.polling.interval_ms = interval;
    }
    if let Some(max_duration) = env_parse("KOMPETE_POLL_MAX_DURATION_SECS")? {
        config.polling.max_duration_secs = max_duration;
    }
    if let Some(max_errors) = env_parse("KOMPETE_POLL_MAX_ERRORS")? {
        config.polling.max_consecutive_errors = max_errors;
    }

    config.prefetch.enabled = env_bool("KOMPETE_PREFETCH_ENABLED", config.prefetch.enabled);
    if let Some(stagger) = env_parse("KOMPETE_PREFETCH_STAGGER_MS")? {
        config.prefetch.stagger_ms = stagger;
    }

    if let Some(level) = env_opt("KOMPETE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("KOMPETE_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `KompeteError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KompeteError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KompeteError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KompeteError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KompeteError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KompeteError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(KompeteError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./kompete.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("kompete.json"),
        dir.join("kompete.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        KompeteError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Non-empty environment variable, if set.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional environment variable.
///
/// # Errors
/// Returns `KompeteError::Config` if the variable is set but unparseable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| KompeteError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
