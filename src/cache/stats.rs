//! Cache Statistics Module
//!
//! Tracks cache effectiveness: hits, misses and capacity evictions.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads served from a fresh entry
    pub hits: u64,
    /// Reads that found nothing or a stale entry
    pub misses: u64,
    /// Entries dropped to make room
    pub evictions: u64,
    /// Entries currently held, stale ones included
    pub total_entries: usize,
    /// Most entries the store will hold
    pub capacity: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read, fresh or not.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// Returns hits / lookups, or 0.0 if nothing has been read.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// True once `total_entries` has reached `capacity`; the next new key
    /// evicts.
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.total_entries >= self.capacity
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
