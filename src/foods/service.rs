//! Food Service
//!
//! Domain queries against the upstream food database: search, nutrient detail
//! and random discovery. Each query consults the shared cache, goes through
//! the [`ResilientFetcher`] on a miss, normalizes the payload and stores the
//! result.

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{FoodError, Result};
use crate::foods::models::{CachedResult, FoodSummary, NutrientDetail};
use crate::foods::normalize;
use crate::upstream::{
    ReqwestTransport, ResilientFetcher, Transport, UpstreamRequest, UpstreamResponse,
};

/// Fields requested from the search endpoint
const SEARCH_FIELDS: &str =
    "code,product_name,brands,categories,image_url,nutriments,serving_size,quantity";

/// Cache shared by every query of the process
pub type SharedCache = Arc<RwLock<CacheStore<CachedResult>>>;

// == Food Service ==
#[derive(Debug, Clone)]
pub struct FoodService {
    fetcher: ResilientFetcher,
    cache: SharedCache,
    base_url: Url,
    user_agent: String,
    search_page_size: u32,
    random_page_size: u32,
    random_seeds: Vec<String>,
}

impl FoodService {
    // == Constructors ==
    /// Builds the service with a reqwest transport and a fresh cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(config, transport)
    }

    /// Builds the service over `transport` with a fresh system-clock cache.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let cache = Arc::new(RwLock::new(CacheStore::new(
            config.cache_max_entries,
            config.cache_ttl(),
        )));
        Self::new(config, transport, cache)
    }

    /// Builds the service over an existing transport and cache.
    ///
    /// # Arguments
    /// * `config` - Upstream location, retry policy, page sizes, seeds
    /// * `transport` - Network seam used by the fetcher
    /// * `cache` - Process-wide result cache
    pub fn new(config: &Config, transport: Arc<dyn Transport>, cache: SharedCache) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| {
                FoodError::InvalidConfig(format!("base URL '{}': {}", config.base_url, e))
            })?;
        if base_url.cannot_be_a_base() {
            return Err(FoodError::InvalidConfig(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            fetcher: ResilientFetcher::new(
                transport,
                config.retry_policy(),
                config.fetch_timeout(),
            ),
            cache,
            base_url,
            user_agent: config.user_agent.clone(),
            search_page_size: config.search_page_size,
            random_page_size: config.random_page_size,
            random_seeds: config.random_seeds.clone(),
        })
    }

    /// Handle to the shared cache.
    pub fn cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }

    // == Search Foods ==
    /// Searches upstream for `query`.
    ///
    /// Blank queries return an empty list without touching the cache or the
    /// network. Results, including empty ones, are cached under
    /// `search:<trimmed lower-cased query>`.
    pub async fn search_foods(&self, query: &str) -> Result<Vec<FoodSummary>> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        let key = format!("search:{}", normalized);
        if let Some(CachedResult::Foods(foods)) = self.cache_get(&key).await {
            debug!(query = %normalized, "Returning cached search results");
            return Ok(foods);
        }

        let payload = self.fetch_json(self.search_url(&normalized, self.search_page_size)?).await?;
        let foods: Vec<FoodSummary> = normalize::products(&payload)
            .iter()
            .filter_map(normalize::food_summary)
            .collect();

        debug!(query = %normalized, results = foods.len(), "Search completed");
        self.cache_put(key, CachedResult::Foods(foods.clone())).await;
        Ok(foods)
    }

    // == Get Food Nutrients ==
    /// Looks up the nutrient breakdown of `food_id`, scaled to `quantity` of
    /// the measure identified by `measure_uri` (`per_100g` when absent).
    ///
    /// Fails with [`FoodError::NotFound`] when upstream answers with an empty
    /// body or without a product. Only successful results are cached.
    pub async fn get_food_nutrients(
        &self,
        food_id: &str,
        label: &str,
        measure_uri: Option<&str>,
        quantity: f64,
    ) -> Result<NutrientDetail> {
        let key = format!(
            "nutrients:{}:{}:{}",
            food_id,
            measure_uri.unwrap_or("default"),
            quantity
        );
        if let Some(CachedResult::Nutrients(detail)) = self.cache_get(&key).await {
            debug!(food_id, label, "Returning cached nutrients");
            return Ok(detail);
        }

        let response = self.fetch(self.product_url(food_id)?).await?;
        if response.body.trim().is_empty() {
            return Err(not_found(food_id));
        }
        let payload: Value = response.json()?;
        let product = match payload.get("product") {
            Some(product) if is_present(product) => product,
            _ => return Err(not_found(food_id)),
        };

        let detail = normalize::nutrient_detail(product, measure_uri, quantity);
        self.cache_put(key, CachedResult::Nutrients(detail.clone())).await;
        Ok(detail)
    }

    // == Get Random Food ==
    /// Picks a random product.
    ///
    /// Tries a broad empty query first, then each seed in order until one
    /// yields at least one usable product. Failed attempts are logged and
    /// count as empty. Returns `None` when every attempt came back empty.
    /// Never cached. The pick is uniform over the page that produced results,
    /// not over the whole upstream catalog.
    pub async fn get_random_food(&self) -> Option<FoodSummary> {
        let attempts = std::iter::once("").chain(self.random_seeds.iter().map(String::as_str));

        for seed in attempts {
            let items = self.random_candidates(seed).await;
            if items.is_empty() {
                continue;
            }
            let picked = items.choose(&mut rand::thread_rng()).cloned();
            debug!(seed, candidates = items.len(), "Picked random food");
            return picked;
        }

        info!("No random food found in any attempt");
        None
    }

    // == Clear Cache ==
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        info!("Food cache cleared");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    // == Internals ==

    async fn random_candidates(&self, seed: &str) -> Vec<FoodSummary> {
        let result = async {
            let payload = self.fetch_json(self.search_url(seed, self.random_page_size)?).await?;
            Ok::<_, FoodError>(
                normalize::products(&payload)
                    .iter()
                    .filter_map(normalize::random_summary)
                    .collect::<Vec<_>>(),
            )
        }
        .await;

        match result {
            Ok(items) => items,
            Err(err) => {
                warn!(seed, error = %err, "Random fetch attempt failed");
                Vec::new()
            }
        }
    }

    async fn cache_get(&self, key: &str) -> Option<CachedResult> {
        // Write lock: reads update hit/miss counters
        self.cache.write().await.get(key)
    }

    async fn cache_put(&self, key: String, value: CachedResult) {
        self.cache.write().await.put(key, value);
    }

    async fn fetch(&self, url: Url) -> Result<UpstreamResponse> {
        let request = UpstreamRequest::new(url.as_str(), self.user_agent.as_str());
        self.fetcher.fetch(&request).await
    }

    async fn fetch_json(&self, url: Url) -> Result<Value> {
        self.fetch(url).await?.json()
    }

    fn search_url(&self, terms: &str, page_size: u32) -> Result<Url> {
        let mut url = self.endpoint(&["cgi", "search.pl"])?;
        url.query_pairs_mut()
            .append_pair("search_terms", terms)
            .append_pair("search_simple", "1")
            .append_pair("action", "process")
            .append_pair("json", "1")
            .append_pair("page_size", &page_size.to_string())
            .append_pair("fields", SEARCH_FIELDS);
        Ok(url)
    }

    fn product_url(&self, food_id: &str) -> Result<Url> {
        let file = format!("{}.json", food_id);
        self.endpoint(&["api", "v2", "product", &file])
    }

    /// Appends `segments` to the base URL path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FoodError::InvalidConfig(format!(
                    "base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn not_found(food_id: &str) -> FoodError {
    FoodError::NotFound {
        food_id: food_id.to_string(),
    }
}

/// JSON truthiness for the product body.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
