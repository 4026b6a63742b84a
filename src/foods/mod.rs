//! Foods Module
//!
//! Domain queries over the upstream food database and the result shapes they
//! produce.

pub mod models;
pub mod normalize;
mod service;

pub use models::{
    CachedResult, FoodSummary, Measure, NutrientDetail, NutrientSummary, PER_100G, PER_SERVING,
};
pub use service::{FoodService, SharedCache};
