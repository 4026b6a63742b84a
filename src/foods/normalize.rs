//! Upstream payload normalization
//!
//! Turns Open Food Facts product records into [`FoodSummary`] and
//! [`NutrientDetail`]. Upstream records are loosely typed: numbers sometimes
//! arrive as strings and empty strings stand in for missing values, so every
//! field goes through the truthiness helpers below.

use serde_json::{Map, Value};

use crate::foods::models::{
    FoodSummary, Measure, NutrientDetail, NutrientSummary, PER_100G, PER_SERVING,
};

/// Label given to products without a name; such products are dropped
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Serving weight assumed when upstream has none
const DEFAULT_SERVING_GRAMS: f64 = 100.0;

/// Grams to milligrams
const MG_PER_G: f64 = 1000.0;

// == Field helpers ==

/// Non-empty string value.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Non-zero finite number, from a JSON number or a numeric string.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n != 0.0).then_some(n)
}

/// Reads `<name>_100g`, then `<name>`, then falls back to 0.
pub fn nutriment(nutriments: &Value, name: &str) -> f64 {
    number(nutriments.get(format!("{}_100g", name)))
        .or_else(|| number(nutriments.get(name)))
        .unwrap_or(0.0)
}

/// Product code as a string; upstream occasionally sends it as a number.
fn product_code(product: &Value) -> String {
    match product.get("code") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn first_category(product: &Value) -> Option<String> {
    let categories = text(product.get("categories"))?;
    let first = categories.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

fn resolve_label(product: &Value) -> Option<String> {
    let label = text(product.get("product_name")).unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
    (label != UNKNOWN_PRODUCT).then_some(label)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// == Products ==
/// The `products` array of a search payload, or nothing.
pub fn products(payload: &Value) -> &[Value] {
    payload
        .get("products")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// == Food Summary ==
/// Normalizes a search result, or `None` when the product has no usable label.
pub fn food_summary(product: &Value) -> Option<FoodSummary> {
    let mut summary = base_summary(product)?;
    let nutriments = product.get("nutriments").unwrap_or(&Value::Null);

    summary.nutrients = NutrientSummary {
        energy_kcal: nutriment(nutriments, "energy-kcal"),
        protein: Some(nutriment(nutriments, "proteins")),
        fat: Some(nutriment(nutriments, "fat")),
        carbs: Some(nutriment(nutriments, "carbohydrates")),
        fiber: Some(nutriment(nutriments, "fiber")),
        sugar: Some(nutriment(nutriments, "sugars")),
        sodium: Some(nutriment(nutriments, "sodium")),
        cholesterol: Some(nutriment(nutriments, "cholesterol")),
    };

    let serving_label = match text(product.get("serving_size")) {
        Some(size) => format!("per serving ({})", size),
        None => "per serving".to_string(),
    };
    summary.measures = vec![
        Measure::new(PER_100G, "per 100g"),
        Measure::new(PER_SERVING, serving_label),
    ];

    Some(summary)
}

/// Normalizes a random-discovery result: calories only, no measures.
pub fn random_summary(product: &Value) -> Option<FoodSummary> {
    let mut summary = base_summary(product)?;
    let nutriments = product.get("nutriments").unwrap_or(&Value::Null);
    summary.nutrients.energy_kcal = nutriment(nutriments, "energy-kcal");
    Some(summary)
}

fn base_summary(product: &Value) -> Option<FoodSummary> {
    let label = resolve_label(product)?;

    Some(FoodSummary {
        food_id: product_code(product),
        label,
        brand: text(product.get("brands")),
        category: first_category(product),
        image: text(product.get("image_url")),
        serving_size: text(product.get("serving_size")).or_else(|| text(product.get("quantity"))),
        nutrients: NutrientSummary::default(),
        measures: Vec::new(),
        raw_product: product.clone(),
    })
}

// == Multiplier ==
/// Scaling factor for a measure and quantity.
///
/// `per_serving` scales by the serving weight over 100g; every other measure,
/// including none, scales by `quantity` alone.
pub fn multiplier(product: &Value, measure_uri: Option<&str>, quantity: f64) -> f64 {
    match measure_uri {
        Some(PER_SERVING) => {
            let serving_grams =
                number(product.get("serving_quantity")).unwrap_or(DEFAULT_SERVING_GRAMS);
            (serving_grams / 100.0) * quantity
        }
        _ => quantity,
    }
}

// == Nutrient Detail ==
pub fn nutrient_detail(
    product: &Value,
    measure_uri: Option<&str>,
    quantity: f64,
) -> NutrientDetail {
    let nutriments = product
        .get("nutriments")
        .filter(|n| n.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let m = multiplier(product, measure_uri, quantity);
    let scaled = |name: &str| nutriment(&nutriments, name) * m;

    NutrientDetail {
        calories: scaled("energy-kcal").round(),
        protein: round1(scaled("proteins")),
        fat: round1(scaled("fat")),
        carbs: round1(scaled("carbohydrates")),
        fiber: round1(scaled("fiber")),
        sugar: round1(scaled("sugars")),
        sodium: round1(scaled("sodium") * MG_PER_G),
        cholesterol: round1(scaled("cholesterol") * MG_PER_G),
        weight: round1(100.0 * m),
        saturated_fat: round1(scaled("saturated-fat")),
        salt: round1(scaled("salt")),
        all_nutrients: nutriments.clone(),
    }
}
