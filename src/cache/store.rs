//! Cache Store Module
//!
//! Bounded TTL cache: HashMap storage with insertion-order eviction and
//! time-based expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, InsertionOrder, SystemClock};

// == Cache Store ==
/// Fixed-capacity map from request fingerprint to result.
///
/// Invariants:
/// - `len() <= max_entries` after every `put`.
/// - Eviction removes the oldest inserted key, never the least recently read.
/// - Stale entries are ignored on read but stay until evicted or overwritten.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: InsertionOrder,
    stats: CacheStats,
    max_entries: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore backed by the system clock.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries (clamped to at least 1)
    /// * `ttl` - How long an entry stays valid after insertion
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self::with_clock(max_entries, ttl, Arc::new(SystemClock))
    }

    /// Creates a new CacheStore reading time from `clock`.
    pub fn with_clock(max_entries: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            ttl,
            clock,
        }
    }

    // == Get ==
    /// Returns the cached value if present and younger than the TTL.
    ///
    /// Stale entries count as misses and are left in place.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => {
                self.stats.record_hit();
                Some(entry.data.clone())
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key` at the newest insertion position.
    ///
    /// When the store is at capacity the oldest inserted key is evicted
    /// first, even if `key` itself is already present.
    pub fn put(&mut self, key: String, value: V) {
        if self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.order.pop_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "Evicted oldest cache entry");
            }
        }

        let entry = CacheEntry::new(value, self.clock.now_ms());
        self.order.push_newest(&key);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Clear ==
    /// Drops every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats.capacity = self.max_entries;
        stats
    }

    /// Checks whether `key` is held, fresh or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
