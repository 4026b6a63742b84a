//! Food result models
//!
//! Stable result shapes returned to callers, independent of the upstream JSON
//! layout. Serialized with camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Measure URI for values per 100 grams
pub const PER_100G: &str = "per_100g";

/// Measure URI for values per serving
pub const PER_SERVING: &str = "per_serving";

// == Measure ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub uri: String,
    pub label: String,
}

impl Measure {
    pub fn new(uri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            label: label.into(),
        }
    }
}

// == Nutrient Summary ==
/// Per-100g nutrient values attached to a search result.
///
/// Random discovery results only carry `energy_kcal`; the other fields are
/// then `None` and omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientSummary {
    pub energy_kcal: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f64>,
}

// == Food Summary ==
/// One normalized upstream product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSummary {
    pub food_id: String,
    pub label: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub serving_size: Option<String>,
    pub nutrients: NutrientSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<Measure>,
    /// Upstream product record as received
    pub raw_product: Value,
}

// == Nutrient Detail ==
/// Nutrient breakdown scaled to a quantity of a measure.
///
/// Calories are whole numbers; everything else has one decimal. Sodium and
/// cholesterol are in milligrams, other masses in grams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientDetail {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
    pub cholesterol: f64,
    pub weight: f64,
    pub saturated_fat: f64,
    pub salt: f64,
    /// Raw upstream `nutriments` object
    pub all_nutrients: Value,
}

// == Cached Result ==
/// What the service keeps in its cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResult {
    Foods(Vec<FoodSummary>),
    Nutrients(NutrientDetail),
}
