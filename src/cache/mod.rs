//! Cache Module
//!
//! Provides a small in-memory cache with TTL expiry and FIFO eviction, used to
//! avoid repeating identical upstream requests.

mod clock;
mod entry;
mod order;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default number of cached results
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Default lifetime of a cached result
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
