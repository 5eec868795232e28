//! Chromium-backed driver using chromiumoxide.
//!
//! Each session launches its own headless browser process so no cookies,
//! storage or cache leak between requests. Subresource blocking uses the
//! CDP Fetch domain: every request is paused and either continued or failed
//! by resource type.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use url::Url;

use super::{BlockedResource, BrowserDriver, BrowserProfile, BrowserSession, RenderError, SessionOptions};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

const SERVERLESS_ARGS: [&str; 5] =
    ["--single-process", "--disable-dev-shm-usage", "--hide-scrollbars", "--disable-web-security", "--no-zygote"];

fn resource_type(blocked: BlockedResource) -> ResourceType {
    match blocked {
        BlockedResource::Image => ResourceType::Image,
        BlockedResource::Stylesheet => ResourceType::Stylesheet,
        BlockedResource::Font => ResourceType::Font,
        BlockedResource::Media => ResourceType::Media,
    }
}

/// Build the chromiumoxide launch configuration for a session.
fn browser_config(opts: &SessionOptions) -> Result<BrowserConfig, RenderError> {
    let (width, height) = opts.viewport;
    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        })
        .arg("--disable-gpu")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--mute-audio");

    match &opts.profile {
        BrowserProfile::Local { executable } => {
            if let Some(path) = executable {
                builder = builder.chrome_executable(path);
            }
        }
        BrowserProfile::Serverless { executable } => {
            builder = builder.chrome_executable(executable).no_sandbox().args(SERVERLESS_ARGS);
        }
    }

    builder.build().map_err(RenderError::BrowserLaunch)
}

/// Launches one headless Chromium per session.
#[derive(Debug, Default, Clone)]
pub struct ChromiumDriver;

impl ChromiumDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn launch(&self, opts: &SessionOptions) -> Result<Box<dyn BrowserSession>, RenderError> {
        let (browser, mut handler) = Browser::launch(browser_config(opts)?)
            .await
            .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = close_browser(&mut browser, &handler_task).await;
                return Err(RenderError::BrowserLaunch(format!("failed to open page: {e}")));
            }
        };

        let mut session = ChromiumSession { browser, page, handler_task, intercept_task: None };
        if let Err(e) = session.configure(opts).await {
            let _ = session.shutdown().await;
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

/// A browser process with a single page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    intercept_task: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    async fn configure(&mut self, opts: &SessionOptions) -> Result<(), RenderError> {
        let identity = SetUserAgentOverrideParams::builder()
            .user_agent(opts.user_agent.clone())
            .accept_language(opts.accept_language.clone())
            .build()
            .map_err(RenderError::BrowserLaunch)?;
        self.page
            .set_user_agent(identity)
            .await
            .map_err(|e| RenderError::BrowserLaunch(format!("failed to set user agent: {e}")))?;

        if opts.blocked_resources.is_empty() {
            return Ok(());
        }

        let blocked: Vec<ResourceType> = opts.blocked_resources.iter().copied().map(resource_type).collect();
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| RenderError::BrowserLaunch(format!("failed to listen for requests: {e}")))?;
        self.page
            .execute(EnableParams::builder().pattern(RequestPattern::builder().url_pattern("*").build()).build())
            .await
            .map_err(|e| RenderError::BrowserLaunch(format!("failed to enable interception: {e}")))?;

        let page = self.page.clone();
        self.intercept_task = Some(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let request_id = event.request_id.clone();
                let outcome = if blocked.contains(&event.resource_type) {
                    page.execute(FailRequestParams::new(request_id, ErrorReason::BlockedByClient))
                        .await
                        .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(request_id)).await.map(|_| ())
                };
                if let Err(e) = outcome {
                    tracing::debug!("request interception failed: {e}");
                }
            }
        }));

        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), RenderError> {
        if let Some(task) = self.intercept_task.take() {
            task.abort();
        }
        let _ = self.page.clone().close().await;
        close_browser(&mut self.browser, &self.handler_task).await
    }
}

/// Close the browser, reap its process, then stop the event handler.
async fn close_browser(browser: &mut Browser, handler_task: &JoinHandle<()>) -> Result<(), RenderError> {
    let closed = browser
        .close()
        .await
        .map(|_| ())
        .map_err(|e| RenderError::BrowserLaunch(format!("failed to close browser: {e}")));
    let _ = browser.wait().await;
    handler_task.abort();
    closed
}

#[async_trait::async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        self.page
            .goto(url.as_str())
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Navigation(e.to_string()))
    }

    async fn title(&self) -> Result<Option<String>, RenderError> {
        self.page
            .get_title()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
    }

    async fn wait_for_selector(&self, selector: &str) -> Result<(), RenderError> {
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn content(&self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        let mut session = *self;
        session.shutdown().await
    }
}
