//! In-memory cache of scrape results.
//!
//! This module provides a bounded, time-limited cache keyed by normalized
//! character name. It supports:
//!
//! - Read-time freshness checks against a fixed TTL
//! - FIFO eviction once the capacity is exceeded
//! - A background sweeper that reclaims expired entries

pub mod key;
pub mod store;
pub mod sweep;

pub use crate::Error;

pub use key::CacheKey;
pub use store::{CacheEntry, CacheStore, DEFAULT_CAPACITY, DEFAULT_TTL};
pub use sweep::{DEFAULT_SWEEP_INTERVAL, SweeperHandle, spawn_sweeper};
