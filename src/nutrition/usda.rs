//! USDA FoodData Central client (`/foods/search`).

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{fallback, round_to, LookupError, Macros};

/// Datasets searched, most reliable first.
const DATA_TYPES: &[&str] = &["Survey (FNDDS)", "SR Legacy", "Foundation"];

/// Search response; only the best match is requested.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Total matches reported by the API.
    #[serde(default)]
    pub total_hits: Option<u64>,
    /// Matched foods.
    #[serde(default)]
    pub foods: Vec<Food>,
}

/// A food record.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    /// Food description.
    #[serde(default)]
    pub description: String,
    /// Nutrient amounts.
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

/// One nutrient amount of a food.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    /// e.g. `Protein`, `Total lipid (fat)`, `Energy`.
    #[serde(default)]
    pub nutrient_name: String,
    /// e.g. `G`, `KCAL`, `kJ`.
    #[serde(default)]
    pub unit_name: String,
    /// Amount in `unit_name`.
    #[serde(default)]
    pub value: f64,
}

/// FoodData Central search client.
#[derive(Clone)]
pub struct UsdaClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for UsdaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsdaClient")
            .field("api_key", &"__REDACTED__")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl UsdaClient {
    /// Client for `base_url` (e.g. `https://api.nal.usda.gov/fdc/v1`).
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Macros of the best match for `food`.
    ///
    /// An empty result falls back to the built-in table; `Ok(None)` means
    /// neither had anything.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] on transport, status, or parse failure.
    pub async fn food_macros(&self, food: &str) -> Result<Option<Macros>, LookupError> {
        let mut query: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("query", food),
            ("pageSize", "1"),
            ("sortBy", "score"),
        ];
        query.extend(DATA_TYPES.iter().map(|t| ("dataType", *t)));

        debug!(food, "searching FoodData Central");
        let response = self
            .client
            .get(format!("{}/foods/search", self.base_url))
            .query(&query)
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
        info!(food, hits = ?parsed.total_hits, "fetched FoodData Central results");

        let Some(best) = parsed.foods.first() else {
            warn!(food, "no FoodData Central match");
            return Ok(fallback::fallback_macros(food));
        };
        let macros = macros_from_nutrients(&best.food_nutrients);
        if macros.is_empty() {
            warn!(food, description = %best.description, "all nutrient values are zero");
        }
        Ok(Some(macros))
    }
}

/// Map FoodData Central nutrient names onto [`Macros`].
pub fn macros_from_nutrients(nutrients: &[FoodNutrient]) -> Macros {
    let mut macros = Macros::default();
    for nutrient in nutrients {
        let name = nutrient.nutrient_name.to_lowercase();
        let value = round_to(nutrient.value, 1);
        if name.contains("protein") {
            macros.protein = value;
        } else if name.contains("carbohydrate") && !name.contains("fiber") {
            macros.carbs = value;
        } else if name.contains("total lipid") || name.contains("total fat") {
            macros.fats = value;
        } else if ["energy", "calories", "kcal"].iter().any(|t| name.contains(t))
            && !nutrient.unit_name.eq_ignore_ascii_case("kj")
        {
            macros.calories = value;
        }
    }
    macros
}
