//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 120_000;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
        return Err(invalid(field, "must be between 1000ms and 120000ms"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_url` is not an http(s) URL
    /// - `realm`, `user_agent` or `ready_selector` is empty
    /// - either timeout is outside 1s..=120s
    /// - the viewport, cache TTL, cache capacity or sweep interval is 0
    ///
    /// Returns `ConfigError::Missing` if serverless mode is on without a
    /// `chrome_executable`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(invalid("base_url", "must be an http(s) URL"));
        }
        if self.realm.trim().is_empty() {
            return Err(invalid("realm", "must not be empty"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.ready_selector.trim().is_empty() {
            return Err(invalid("ready_selector", "must not be empty"));
        }

        check_timeout("navigation_timeout_ms", self.navigation_timeout_ms)?;
        check_timeout("ready_timeout_ms", self.ready_timeout_ms)?;
        check_timeout("content_timeout_ms", self.content_timeout_ms)?;

        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(invalid("viewport", "width and height must be greater than 0"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(invalid("cache_ttl_secs", "must be greater than 0"));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("cache_capacity", "must be greater than 0"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(invalid("sweep_interval_secs", "must be greater than 0"));
        }

        if self.serverless && self.chrome_executable.is_none() {
            return Err(ConfigError::Missing {
                field: "chrome_executable".into(),
                hint: "Set ARMORY_CHROME_EXECUTABLE to the bundled browser binary".into(),
            });
        }

        if self.challenge_phrases.is_empty() {
            tracing::warn!("challenge_phrases is empty; bot-verification pages will wait out the ready timeout");
        }
        if self.sweep_interval_secs > self.cache_ttl_secs {
            tracing::warn!(
                sweep_interval_secs = self.sweep_interval_secs,
                cache_ttl_secs = self.cache_ttl_secs,
                "Sweep interval is longer than the cache TTL; expired entries will linger in memory"
            );
        }

        Ok(())
    }
}
