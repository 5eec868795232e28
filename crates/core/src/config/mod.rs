//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ARMORY_*, plus a bare PORT)
//! 2. TOML config file (if ARMORY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Environment variable whose presence marks a constrained serverless runtime.
pub const SERVERLESS_MARKER_ENV: &str = "AWS_LAMBDA_FUNCTION_VERSION";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ARMORY_*, and PORT for the listen port)
/// 2. TOML config file (if ARMORY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the HTTP server listens on.
    ///
    /// Set via PORT or ARMORY_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Armory site root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Realm segment of the character page URL.
    #[serde(default = "default_realm")]
    pub realm: String,

    /// User-Agent presented by the browser session.
    ///
    /// Set via ARMORY_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language presented by the browser session.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Bound on page navigation in milliseconds.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Bound on waiting for the readiness selector in milliseconds.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Bound on reading the page title and the rendered document, in milliseconds.
    #[serde(default = "default_content_timeout_ms")]
    pub content_timeout_ms: u64,

    /// Selector whose presence means the equipment has rendered.
    #[serde(default = "default_ready_selector")]
    pub ready_selector: String,

    /// Page-title phrases that identify a bot-verification interstitial.
    ///
    /// Matched case-insensitively as substrings.
    #[serde(default = "default_challenge_phrases")]
    pub challenge_phrases: Vec<String>,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// How long a scrape result stays servable, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached characters.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Interval between background cache sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Run with the constrained serverless browser profile.
    ///
    /// Defaults to true when AWS_LAMBDA_FUNCTION_VERSION is present.
    /// Set via ARMORY_SERVERLESS environment variable.
    #[serde(default)]
    pub serverless: bool,

    /// Explicit browser binary. Required in serverless mode; otherwise the
    /// locally installed Chrome/Chromium is discovered automatically.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
}

fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    "https://armory.warmane.com".into()
}

fn default_realm() -> String {
    "Icecrown".into()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .into()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".into()
}

fn default_navigation_timeout_ms() -> u64 {
    18_000
}

fn default_content_timeout_ms() -> u64 {
    10_000
}

fn default_ready_timeout_ms() -> u64 {
    15_000
}

fn default_ready_selector() -> String {
    ".item-left div div a".into()
}

fn default_challenge_phrases() -> Vec<String> {
    ["just a moment", "attention required", "verify you are human", "are you a robot", "checking your browser"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    50
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_url: default_base_url(),
            realm: default_realm(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            content_timeout_ms: default_content_timeout_ms(),
            ready_selector: default_ready_selector(),
            challenge_phrases: default_challenge_phrases(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            sweep_interval_secs: default_sweep_interval_secs(),
            serverless: false,
            chrome_executable: None,
        }
    }
}

impl AppConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ARMORY_`
    /// 2. The bare `PORT` environment variable
    /// 3. TOML file from `ARMORY_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`, with `serverless`
    ///    switched on when `AWS_LAMBDA_FUNCTION_VERSION` is present
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self { serverless: std::env::var_os(SERVERLESS_MARKER_ENV).is_some(), ..Self::default() };
        let mut figment = Figment::from(Serialized::defaults(defaults));

        if let Ok(config_path) = std::env::var("ARMORY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::raw().only(&["PORT"])).merge(
            Env::prefixed("ARMORY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
