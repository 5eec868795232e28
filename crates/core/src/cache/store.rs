//! Bounded in-memory store of scrape results.
//!
//! Entries expire after a fixed TTL and are evicted in insertion order
//! (FIFO) once the store grows past its capacity. Freshness is checked on
//! every read, so the periodic sweep only reclaims memory and never decides
//! what a caller gets to see.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;

use super::CacheKey;
use crate::record::ScrapeResult;

/// Default time-to-live of a cached result (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cached characters.
pub const DEFAULT_CAPACITY: usize = 50;

/// A cached scrape result with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<ScrapeResult>,
    pub inserted_at: Instant,
}

impl CacheEntry {
    /// An entry is fresh while strictly less than `ttl` has elapsed.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, Slot>,
    /// Insertion sequence -> key; the first element is the oldest insertion.
    order: BTreeMap<u64, CacheKey>,
    next_seq: u64,
}

/// TTL cache with FIFO eviction, shared between request tasks.
#[derive(Debug)]
pub struct CacheStore {
    inner: RwLock<Inner>,
    ttl: Duration,
    capacity: usize,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl CacheStore {
    /// Create an empty store. A capacity of zero is treated as one.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { inner: RwLock::new(Inner::default()), ttl, capacity: capacity.max(1) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries, including stale ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a fresh entry.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.get_at(key, Instant::now())
    }

    /// Look up an entry that is fresh at `now`. Stale entries are left for the sweep.
    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<CacheEntry> {
        self.read()
            .entries
            .get(key)
            .filter(|slot| slot.entry.is_fresh(now, self.ttl))
            .map(|slot| slot.entry.clone())
    }

    /// Insert or overwrite an entry stamped with the current time.
    pub fn put(&self, key: CacheKey, payload: ScrapeResult) -> Arc<ScrapeResult> {
        self.put_at(key, payload, Instant::now())
    }

    /// Insert or overwrite an entry stamped with `now`.
    ///
    /// An overwrite counts as a new insertion. If the store then holds more
    /// than `capacity` entries, the oldest insertions are evicted.
    pub fn put_at(&self, key: CacheKey, payload: ScrapeResult, now: Instant) -> Arc<ScrapeResult> {
        let payload = Arc::new(payload);
        let entry = CacheEntry { payload: Arc::clone(&payload), inserted_at: now };

        let mut guard = self.write();
        let Inner { entries, order, next_seq } = &mut *guard;

        let seq = *next_seq;
        *next_seq += 1;

        if let Some(previous) = entries.insert(key.clone(), Slot { entry, seq }) {
            order.remove(&previous.seq);
        }
        order.insert(seq, key);

        while entries.len() > self.capacity {
            let Some((_, oldest)) = order.pop_first() else { break };
            entries.remove(&oldest);
            tracing::debug!(key = %oldest, "evicted oldest cache entry");
        }

        payload
    }

    /// Remove every entry that is stale at `now`. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut guard = self.write();
        let Inner { entries, order, .. } = &mut *guard;

        let before = entries.len();
        entries.retain(|_, slot| {
            let fresh = slot.entry.is_fresh(now, self.ttl);
            if !fresh {
                order.remove(&slot.seq);
            }
            fresh
        });
        before - entries.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
