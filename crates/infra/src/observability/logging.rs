//! Global `tracing` subscriber

use kompete_domain::{KompeteError, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter built from a directive such as `info` or `kompete_core=debug,info`.
///
/// # Errors
/// Returns `KompeteError::Config` when the directive does not parse.
pub fn build_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| KompeteError::Config(format!("Invalid log filter '{}': {}", directive, e)))
}

/// Install the global subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. Output is
/// plain text, or one JSON object per line when `config.json` is set.
///
/// # Errors
/// Returns `KompeteError::Config` for an invalid filter, or when a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };

    let (json, plain) = if config.json {
        (Some(fmt::layer().json().with_target(true).with_current_span(true)), None)
    } else {
        (None, Some(fmt::layer().with_target(true)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()
        .map_err(|e| KompeteError::Config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::debug!(level = %config.level, json = config.json, "tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_per_crate_directives() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("kompete_core=debug,kompete_infra=trace,warn").is_ok());
    }

    #[test]
    fn rejects_malformed_directive() {
        let err = build_filter("kompete_core=loud").unwrap_err();
        assert!(matches!(err, KompeteError::Config(_)));
    }
}
