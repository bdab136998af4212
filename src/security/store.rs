//! Rate limit window storage.
//!
//! # Design Decisions
//! - The limiter only talks to the `RateStore` trait, so a shared
//!   (cross-instance) counter service can replace the in-process map
//! - `hit` is the whole read-check-increment-write sequence; implementations
//!   must make it atomic per key
//! - Expired windows are replaced, never merged

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// One fixed window for one `class:identity` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateEntry {
    /// Requests observed in the current window, starting at 1.
    pub count: u32,
    /// Instant at which the window ends.
    pub reset_at: Instant,
}

impl RateEntry {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    /// True once the window has elapsed.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.reset_at <= now
    }
}

/// Storage backend for fixed-window counters.
pub trait RateStore: Send + Sync {
    /// Record one request for `key` and return the entry after the update.
    ///
    /// Opens a fresh window (`count = 1`) when none exists or the current
    /// one has expired, otherwise increments the count in place.
    fn hit(&self, key: &str, now: Instant, window: Duration) -> RateEntry;

    /// Drop every entry whose window has elapsed. Returns how many were removed.
    fn sweep_expired(&self, now: Instant) -> usize;

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store backed by a sharded concurrent map.
///
/// The entry API holds the shard lock for the duration of `hit`, which
/// serializes concurrent updates to the same key.
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    entries: DashMap<String, RateEntry>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a single entry, mostly for tests and diagnostics.
    pub fn get(&self, key: &str) -> Option<RateEntry> {
        self.entries.get(key).map(|e| *e)
    }
}

impl RateStore for MemoryRateStore {
    fn hit(&self, key: &str, now: Instant, window: Duration) -> RateEntry {
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.is_expired(now) {
                    *entry = RateEntry::fresh(now, window);
                } else {
                    entry.count = entry.count.saturating_add(1);
                }
                *entry
            }
            Entry::Vacant(vacant) => {
                let entry = RateEntry::fresh(now, window);
                vacant.insert(entry);
                entry
            }
        }
    }

    fn sweep_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
