//! Food Lookup - resilient client for the Open Food Facts database
//!
//! Proxies food search, nutrient lookup and random discovery through a
//! retrying, timing-out fetch pipeline with a small TTL cache in front.

pub mod cache;
pub mod config;
pub mod error;
pub mod foods;
pub mod upstream;

pub use config::Config;
pub use error::{ErrorKind, FoodError, Result};
pub use foods::{FoodService, FoodSummary, NutrientDetail};
