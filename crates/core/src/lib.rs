//! Core types and shared functionality for the armory scraper.
//!
//! This crate provides:
//! - In-memory TTL cache with FIFO eviction and a background sweeper
//! - Unified error types
//! - Configuration structures
//! - Scrape result records

pub mod cache;
pub mod config;
pub mod error;
pub mod record;

pub use cache::{CacheEntry, CacheKey, CacheStore};
pub use config::{AppConfig, ConfigError};
pub use error::{Error, FailureStage};
pub use record::{AttributeRecord, ScrapeResult, Zone};
