//! Character page fetching through an isolated browser session.
//!
//! ### Session Lifecycle
//! - One fresh session per fetch, never reused across requests.
//! - The session lives in a [`SessionGuard`] and is closed on every exit path.
//!
//! ### State Machine
//! `Idle -> SessionOpened -> NavigationRequested -> {Ready | ChallengeDetected | TimedOut | NavError}`
//!
//! ### Bounds
//! - Navigation, the title read, the readiness wait and the document read
//!   each run under their own `tokio::time::timeout`, regardless of what the
//!   driver does.
//! - A bot-verification title fails the fetch right after navigation,
//!   without waiting for the readiness selector.

pub mod challenge;
pub mod url;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use armory_core::{AppConfig, Error};

pub use self::challenge::is_challenge_title;
pub use self::url::character_url;

use crate::render::{BrowserDriver, RenderError, SessionGuard, SessionOptions};

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Armory site root (default: "https://armory.warmane.com").
    pub base_url: String,

    /// Realm path segment (default: "Icecrown").
    pub realm: String,

    /// Navigation bound (default: 18s).
    pub navigation_timeout: Duration,

    /// Readiness wait bound (default: 15s).
    pub ready_timeout: Duration,

    /// Bound on each title or document read (default: 10s).
    pub content_timeout: Duration,

    /// Selector that marks the page as rendered.
    pub ready_selector: String,

    /// Title phrases identifying a bot-verification page.
    pub challenge_phrases: Vec<String>,

    /// Options for each browser session.
    pub session: SessionOptions,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl FetchConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            realm: config.realm.clone(),
            navigation_timeout: config.navigation_timeout(),
            ready_timeout: config.ready_timeout(),
            content_timeout: config.content_timeout(),
            ready_selector: config.ready_selector.clone(),
            challenge_phrases: config.challenge_phrases.clone(),
            session: SessionOptions::from_config(config),
        }
    }
}

/// Lifecycle of a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    SessionOpened,
    NavigationRequested,
    Ready,
    ChallengeDetected,
    TimedOut,
    NavError,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the current state of one fetch and logs each transition.
struct Transitions<'a> {
    url: &'a ::url::Url,
    state: FetchState,
}

impl<'a> Transitions<'a> {
    fn new(url: &'a ::url::Url) -> Self {
        Self { url, state: FetchState::Idle }
    }

    fn advance(&mut self, next: FetchState) {
        tracing::debug!(target_url = %self.url, from = %self.state, to = %next, "fetch state");
        self.state = next;
    }

    fn fail(&mut self, next: FetchState, err: Error) -> Error {
        self.advance(next);
        err
    }
}

/// A rendered page whose browser session is still open.
///
/// Dropping it releases the session in the background; prefer [`FetchedPage::close`].
pub struct FetchedPage {
    /// The page URL that was loaded.
    pub url: ::url::Url,
    /// Time from launch to readiness in milliseconds.
    pub fetch_ms: u64,
    session: SessionGuard,
    content_timeout: Duration,
}

impl FetchedPage {
    /// Serialized rendered document.
    ///
    /// Failures here happen after a successful fetch, so they surface as
    /// `Error::ExtractFailed`, including a read that exceeds the content bound.
    pub async fn content(&self) -> Result<String, Error> {
        let session = self.session.session().map_err(|e| Error::ExtractFailed(e.to_string()))?;
        match tokio::time::timeout(self.content_timeout, session.content()).await {
            Ok(result) => result.map_err(|e| Error::ExtractFailed(e.to_string())),
            Err(_) => Err(Error::ExtractFailed(format!(
                "document retrieval exceeded {}ms",
                self.content_timeout.as_millis()
            ))),
        }
    }

    /// Close the underlying browser session.
    pub async fn close(self) {
        self.session.close().await;
    }
}

/// Loads character pages through a [`BrowserDriver`].
pub struct Fetcher {
    driver: Arc<dyn BrowserDriver>,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(driver: Arc<dyn BrowserDriver>, config: FetchConfig) -> Self {
        Self { driver, config }
    }

    /// Load the summary page of `character` and wait until it has rendered.
    ///
    /// Exactly one attempt is made. On failure the browser session has
    /// already been closed when this returns.
    pub async fn fetch(&self, character: &str) -> Result<FetchedPage, Error> {
        let start = Instant::now();
        let url = character_url(&self.config.base_url, character, &self.config.realm)?;
        let mut transitions = Transitions::new(&url);

        let session = self
            .driver
            .launch(&self.config.session)
            .await
            .map_err(|e| Error::BrowserLaunch(e.to_string()))?;
        let mut guard = SessionGuard::new(session, url.as_str());
        transitions.advance(FetchState::SessionOpened);

        if let Err(e) = self.drive(&mut guard, &mut transitions).await {
            guard.close().await;
            return Err(e);
        }

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("fetched {} in {}ms", url, fetch_ms);

        Ok(FetchedPage { url, fetch_ms, session: guard, content_timeout: self.config.content_timeout })
    }

    async fn drive(&self, guard: &mut SessionGuard, transitions: &mut Transitions<'_>) -> Result<(), Error> {
        let url = transitions.url;
        let session = guard.session_mut().map_err(|e| Error::NavigationFailed(e.to_string()))?;

        transitions.advance(FetchState::NavigationRequested);
        let nav_ms = self.config.navigation_timeout.as_millis();
        match tokio::time::timeout(self.config.navigation_timeout, session.navigate(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(transitions.fail(FetchState::NavError, Error::NavigationFailed(e.to_string()))),
            Err(_) => {
                return Err(transitions.fail(
                    FetchState::TimedOut,
                    Error::FetchTimeout(format!("navigation to {url} exceeded {nav_ms}ms")),
                ));
            }
        }

        match tokio::time::timeout(self.config.content_timeout, session.title()).await {
            Ok(Ok(Some(title))) if is_challenge_title(&title, &self.config.challenge_phrases) => {
                tracing::warn!(target_url = %url, %title, "bot verification page detected");
                return Err(transitions.fail(FetchState::ChallengeDetected, Error::ChallengeDetected(title)));
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(target_url = %url, "could not read page title: {e}"),
            Err(_) => tracing::warn!(
                target_url = %url,
                "page title unreadable within {}ms, skipping challenge check",
                self.config.content_timeout.as_millis()
            ),
        }

        let selector = self.config.ready_selector.as_str();
        let ready_ms = self.config.ready_timeout.as_millis();
        match tokio::time::timeout(self.config.ready_timeout, session.wait_for_selector(selector)).await {
            Ok(Ok(())) => {
                transitions.advance(FetchState::Ready);
                Ok(())
            }
            Ok(Err(RenderError::BrowserClosed)) => {
                Err(transitions.fail(FetchState::NavError, Error::NavigationFailed("browser closed during wait".into())))
            }
            Ok(Err(e)) => Err(transitions.fail(FetchState::NavError, Error::NavigationFailed(e.to_string()))),
            Err(_) => Err(transitions.fail(
                FetchState::TimedOut,
                Error::FetchTimeout(format!("readiness selector {selector:?} not found within {ready_ms}ms")),
            )),
        }
    }
}
