//! Configuration Module
//!
//! Handles loading and managing client configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::upstream::RetryPolicy;

/// Default upstream base URL (Open Food Facts)
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Default User-Agent; upstream policy requires one on every call
pub const DEFAULT_USER_AGENT: &str = "FoodLookup/1.0 (Educational Project)";

/// Seed queries tried in order when the broad random search comes back empty
pub const DEFAULT_RANDOM_SEEDS: [&str; 8] = [
    "chocolate",
    "bread",
    "milk",
    "cheese",
    "juice",
    "rice",
    "apple",
    "cereal",
];

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream API base URL
    pub base_url: String,
    /// User-Agent sent on every upstream request
    pub user_agent: String,
    /// Hard deadline for a single attempt, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Backoff base delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum number of cached results
    pub cache_max_entries: usize,
    /// Cached result lifetime in seconds
    pub cache_ttl_secs: u64,
    /// Page size for food searches
    pub search_page_size: u32,
    /// Page size for random discovery
    pub random_page_size: u32,
    /// Ordered fallback queries for random discovery
    pub random_seeds: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FOOD_API_BASE_URL` - Upstream base URL (default: Open Food Facts)
    /// - `FOOD_API_USER_AGENT` - User-Agent header value
    /// - `FETCH_TIMEOUT_MS` - Per-attempt timeout (default: 15000)
    /// - `MAX_RETRIES` - Retries after the first attempt (default: 3)
    /// - `BASE_DELAY_MS` - Backoff base delay (default: 2000)
    /// - `CACHE_MAX_ENTRIES` - Cache capacity (default: 10)
    /// - `CACHE_TTL_SECS` - Cache TTL (default: 300)
    /// - `SEARCH_PAGE_SIZE` - Search page size (default: 20)
    /// - `RANDOM_PAGE_SIZE` - Random discovery page size (default: 100)
    /// - `RANDOM_SEEDS` - Comma-separated fallback queries
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_url: env::var("FOOD_API_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.base_url),
            user_agent: env::var("FOOD_API_USER_AGENT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_ms),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            base_delay_ms: env::var("BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.base_delay_ms),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_max_entries),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            search_page_size: env::var("SEARCH_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.search_page_size),
            random_page_size: env::var("RANDOM_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.random_page_size),
            random_seeds: env::var("RANDOM_SEEDS")
                .ok()
                .map(|v| parse_seed_list(&v))
                .filter(|seeds| !seeds.is_empty())
                .unwrap_or(defaults.random_seeds),
        }
    }

    /// Retry policy derived from `max_retries` and `base_delay_ms`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_ms: 15_000,
            max_retries: 3,
            base_delay_ms: 2_000,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            search_page_size: 20,
            random_page_size: 100,
            random_seeds: DEFAULT_RANDOM_SEEDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Splits a comma-separated seed list, dropping blank entries.
fn parse_seed_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
