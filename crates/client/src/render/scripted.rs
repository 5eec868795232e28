//! In-memory browser driver with scripted behavior.
//!
//! Every launched session replays the same [`ScriptedPage`]. The driver
//! counts launches and closes and records visited URLs so tests can assert
//! on session lifecycle without a real browser.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use url::Url;

use super::{BrowserDriver, BrowserSession, RenderError, SessionOptions};

/// How a scripted navigation behaves.
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    /// Load event fires immediately.
    Loaded,
    /// Navigation never completes.
    Hang,
    /// Navigation fails with the given message.
    Fail(String),
}

/// The page every scripted session serves.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    pub title: Option<String>,
    pub html: String,
    pub navigation: NavigationOutcome,
    /// Whether the readiness selector ever appears.
    pub ready: bool,
    /// If set, `content()` fails with this message.
    pub content_error: Option<String>,
    /// `title()` never resolves.
    pub title_hangs: bool,
    /// `content()` never resolves.
    pub content_hangs: bool,
}

impl ScriptedPage {
    /// A page that loads and becomes ready immediately.
    pub fn ready(html: impl Into<String>) -> Self {
        Self {
            title: None,
            html: html.into(),
            navigation: NavigationOutcome::Loaded,
            ready: true,
            content_error: None,
            title_hangs: false,
            content_hangs: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_navigation(mut self, navigation: NavigationOutcome) -> Self {
        self.navigation = navigation;
        self
    }

    /// The readiness selector never matches.
    pub fn never_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Reading the title blocks forever, as when page script starves the evaluator.
    pub fn with_hanging_title(mut self) -> Self {
        self.title_hangs = true;
        self
    }

    pub fn with_hanging_content(mut self) -> Self {
        self.content_hangs = true;
        self
    }

    pub fn with_content_error(mut self, message: impl Into<String>) -> Self {
        self.content_error = Some(message.into());
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    launches: AtomicUsize,
    closes: AtomicUsize,
    visited: Mutex<Vec<String>>,
    last_options: Mutex<Option<SessionOptions>>,
}

/// Driver whose sessions replay a [`ScriptedPage`].
#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    page: ScriptedPage,
    launch_error: Option<String>,
    counters: Arc<Counters>,
}

impl ScriptedDriver {
    pub fn new(page: ScriptedPage) -> Self {
        Self { page, launch_error: None, counters: Arc::default() }
    }

    /// A driver whose `launch` always fails.
    pub fn failing_launch(message: impl Into<String>) -> Self {
        Self { launch_error: Some(message.into()), ..Self::new(ScriptedPage::ready("")) }
    }

    /// Number of sessions launched.
    pub fn launches(&self) -> usize {
        self.counters.launches.load(Ordering::SeqCst)
    }

    /// Number of sessions closed.
    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    /// URLs successfully navigated to, in order.
    pub fn visited(&self) -> Vec<String> {
        self.counters.visited.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Options passed to the most recent launch.
    pub fn last_options(&self) -> Option<SessionOptions> {
        self.counters.last_options.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn launch(&self, opts: &SessionOptions) -> Result<Box<dyn BrowserSession>, RenderError> {
        *self.counters.last_options.lock().unwrap_or_else(PoisonError::into_inner) = Some(opts.clone());

        if let Some(message) = &self.launch_error {
            return Err(RenderError::BrowserLaunch(message.clone()));
        }

        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession { page: self.page.clone(), counters: Arc::clone(&self.counters) }))
    }
}

struct ScriptedSession {
    page: ScriptedPage,
    counters: Arc<Counters>,
}

#[async_trait::async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        match &self.page.navigation {
            NavigationOutcome::Loaded => {
                self.counters
                    .visited
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(url.to_string());
                Ok(())
            }
            NavigationOutcome::Hang => std::future::pending().await,
            NavigationOutcome::Fail(message) => Err(RenderError::Navigation(message.clone())),
        }
    }

    async fn title(&self) -> Result<Option<String>, RenderError> {
        if self.page.title_hangs {
            std::future::pending::<()>().await;
        }
        Ok(self.page.title.clone())
    }

    async fn wait_for_selector(&self, _selector: &str) -> Result<(), RenderError> {
        if self.page.ready { Ok(()) } else { std::future::pending().await }
    }

    async fn content(&self) -> Result<String, RenderError> {
        if self.page.content_hangs {
            std::future::pending::<()>().await;
        }
        match &self.page.content_error {
            Some(message) => Err(RenderError::ContentRetrieval(message.clone())),
            None => Ok(self.page.html.clone()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
