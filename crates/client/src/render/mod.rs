//! Headless browser sessions for rendering character pages.
//!
//! This module provides the driver/session traits the fetcher talks to, a
//! scoped [`SessionGuard`] that always closes its session, and two drivers:
//! a feature-gated chromiumoxide implementation and a scripted in-memory one
//! for tests.

use std::path::PathBuf;

use armory_core::AppConfig;
use thiserror::Error;
use url::Url;

#[cfg(feature = "render")]
pub mod chromium;
pub mod guard;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

#[cfg(feature = "render")]
pub use chromium::ChromiumDriver;
pub use guard::SessionGuard;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{NavigationOutcome, ScriptedDriver, ScriptedPage};

/// Errors that can occur while driving a browser session.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or configure the browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to read the rendered document.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// Session was already closed.
    #[error("browser session closed")]
    BrowserClosed,
}

/// Subresource types a session refuses to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedResource {
    Image,
    Stylesheet,
    Font,
    Media,
}

/// Which browser binary to run and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserProfile {
    /// Locally installed Chrome/Chromium, discovered when `executable` is `None`.
    Local { executable: Option<PathBuf> },
    /// Bundled lightweight binary in a constrained serverless runtime.
    Serverless { executable: PathBuf },
}

/// Options applied to every new browser session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// User-Agent override.
    pub user_agent: String,

    /// Accept-Language override.
    pub accept_language: String,

    /// Viewport dimensions (default: 1280x720).
    pub viewport: (u32, u32),

    /// Subresources that are failed instead of fetched.
    pub blocked_resources: Vec<BlockedResource>,

    pub profile: BrowserProfile,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl SessionOptions {
    /// Build session options from application config.
    pub fn from_config(config: &AppConfig) -> Self {
        let profile = match (&config.chrome_executable, config.serverless) {
            (Some(executable), true) => BrowserProfile::Serverless { executable: executable.clone() },
            (executable, _) => BrowserProfile::Local { executable: executable.clone() },
        };

        Self {
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            viewport: (config.viewport_width, config.viewport_height),
            blocked_resources: vec![
                BlockedResource::Image,
                BlockedResource::Stylesheet,
                BlockedResource::Font,
                BlockedResource::Media,
            ],
            profile,
        }
    }
}

/// A browser engine that opens one isolated session per call.
#[async_trait::async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Launch a fresh session configured with `opts`.
    async fn launch(&self, opts: &SessionOptions) -> Result<Box<dyn BrowserSession>, RenderError>;
}

/// A single browser session holding one page.
///
/// Implementations do not bound their own waits; callers wrap calls in
/// `tokio::time::timeout`.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to `url` and wait for the load event.
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError>;

    /// Current document title, if any.
    async fn title(&self) -> Result<Option<String>, RenderError>;

    /// Resolve once `selector` matches an element.
    async fn wait_for_selector(&self, selector: &str) -> Result<(), RenderError>;

    /// Serialized rendered document.
    async fn content(&self) -> Result<String, RenderError>;

    /// Release every resource held by the session.
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}
