//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

// == Cache Entry ==
/// A cached result together with the moment it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored result
    pub data: V,
    /// Insertion timestamp (Unix milliseconds)
    pub timestamp: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms`.
    pub fn new(data: V, now_ms: u64) -> Self {
        Self {
            data,
            timestamp: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since insertion; zero if the clock went backwards.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    // == Is Fresh ==
    /// Checks if the entry is still valid.
    ///
    /// Boundary condition: an entry is valid only while `now - timestamp < ttl`.
    /// Once the full TTL has elapsed the entry is stale.
    pub fn is_fresh(&self, now_ms: u64, ttl: Duration) -> bool {
        (self.age_ms(now_ms) as u128) < ttl.as_millis()
    }
}
