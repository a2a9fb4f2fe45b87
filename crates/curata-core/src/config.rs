//! Configuration module
//!
//! Environment-driven settings for the review pipeline: debounce intervals
//! for slug negotiation and defaults for the API client.

use std::env;
use std::time::Duration;

use crate::error::AppError;

// Defaults
const TITLE_DEBOUNCE_MS: u64 = 500;
const MANUAL_SLUG_DEBOUNCE_MS: u64 = 800;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NAMESPACE: &str = "default";

/// Review pipeline configuration
#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// Debounce before a title edit triggers slug resolution.
    pub title_debounce: Duration,
    /// Debounce before a manual slug edit triggers slug resolution.
    pub manual_slug_debounce: Duration,
    /// Timeout for individual API requests.
    pub request_timeout: Duration,
    /// Namespace the review screen operates in.
    pub namespace: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            title_debounce: Duration::from_millis(TITLE_DEBOUNCE_MS),
            manual_slug_debounce: Duration::from_millis(MANUAL_SLUG_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl ReviewConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: CURATA_TITLE_DEBOUNCE_MS,
    /// CURATA_SLUG_DEBOUNCE_MS, CURATA_REQUEST_TIMEOUT_SECS,
    /// CURATA_NAMESPACE.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(ms) = parse_env_u64("CURATA_TITLE_DEBOUNCE_MS")? {
            config.title_debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env_u64("CURATA_SLUG_DEBOUNCE_MS")? {
            config.manual_slug_debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_env_u64("CURATA_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(namespace) = env::var("CURATA_NAMESPACE") {
            if !namespace.trim().is_empty() {
                config.namespace = namespace;
            }
        }

        Ok(config)
    }
}

fn parse_env_u64(name: &str) -> Result<Option<u64>, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} must be an integer, got '{}'", name, value))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReviewConfig::default();
        assert_eq!(config.title_debounce, Duration::from_millis(500));
        assert_eq!(config.manual_slug_debounce, Duration::from_millis(800));
        assert_eq!(config.namespace, "default");
    }
}
