//! Open Food Facts client (`/cgi/search.pl`).

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{fallback, round_to, LookupError, Micronutrients};

/// Fields requested from the search endpoint.
const FIELDS: &str = "nutriments,product_name,iron_100g,calcium_100g,vitamin-a_100g,\
vitamin-c_100g,vitamin-b12_100g,folates_100g,potassium_100g";

/// Search response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Matched products.
    #[serde(default)]
    pub products: Vec<Product>,
}

/// A product record.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct Product {
    /// Product name.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Nutriment map; values may be numbers or numeric strings.
    #[serde(default)]
    pub nutriments: serde_json::Map<String, Value>,
}

/// Open Food Facts search client.
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    /// Client for `base_url` (e.g. `https://world.openfoodfacts.org`).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Micronutrients per 100 g for `food`.
    ///
    /// The built-in table is consulted before the network.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] on transport, status, or parse failure.
    pub async fn micronutrients(&self, food: &str) -> Result<Option<Micronutrients>, LookupError> {
        if let Some(known) = fallback::fallback_micronutrients(food) {
            return Ok(Some(known));
        }

        debug!(food, "searching Open Food Facts");
        let response = self
            .client
            .get(format!("{}/cgi/search.pl", self.base_url))
            .query(&[
                ("search_terms", food),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("fields", FIELDS),
                ("page_size", "1"),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::Parse(e.to_string()))?;
        info!(food, results = parsed.products.len(), "fetched Open Food Facts results");

        let Some(product) = parsed.products.first() else {
            warn!(food, "no Open Food Facts match");
            return Ok(None);
        };
        Ok(Some(micros_from_nutriments(&product.nutriments)))
    }
}

/// Read `*_100g` nutriments, missing or unparsable values counting as zero.
pub fn micros_from_nutriments(nutriments: &serde_json::Map<String, Value>) -> Micronutrients {
    let get = |key: &str| round_to(nutriments.get(key).and_then(number).unwrap_or(0.0), 2);
    Micronutrients {
        iron: get("iron_100g"),
        calcium: get("calcium_100g"),
        vitamin_a: get("vitamin-a_100g"),
        vitamin_c: get("vitamin-c_100g"),
        vitamin_b12: get("vitamin-b12_100g"),
        folates: get("folates_100g"),
        potassium: get("potassium_100g"),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
