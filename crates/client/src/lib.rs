//! Client code for the armory scraper.
//!
//! This crate provides the browser fetch pipeline, equipment extraction, and
//! the request orchestrator shared by the server and CLI.

pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod render;

pub use extract::{DomNode, DomQuery, Extractor, HtmlDom, ZoneExtractor, merge_attributes};
pub use fetch::{FetchConfig, FetchState, FetchedPage, Fetcher, character_url, is_challenge_title};
pub use pipeline::{Scrape, ScrapeSource, Scraper};
pub use render::{BrowserDriver, BrowserProfile, BrowserSession, RenderError, SessionGuard, SessionOptions};

#[cfg(feature = "render")]
pub use render::ChromiumDriver;
