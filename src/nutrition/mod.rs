//! Food nutrition lookups.
//!
//! Macros come from USDA FoodData Central, micronutrients from Open Food
//! Facts. Both sides fall back to a small built-in table ([`fallback`]) so
//! common foods still get numbers when an API is unreachable or unkeyed.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::NutritionConfig;

pub mod fallback;
pub mod open_food_facts;
pub mod usda;

pub use open_food_facts::OpenFoodFactsClient;
pub use usda::UsdaClient;

/// Shown when no macro data could be found.
pub const MACROS_UNAVAILABLE: &str = "(Nutrition data unavailable)";
/// Shown when no micronutrient data could be found.
pub const MICROS_UNAVAILABLE: &str = "(Micronutrient data unavailable)";

/// Errors from the nutrition APIs.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// HTTP transport failure.
    #[error("nutrition request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API answered with an error status.
    #[error("nutrition API returned status {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },
    /// The response body did not match the expected shape.
    #[error("nutrition response parse error: {0}")]
    Parse(String),
}

/// Macronutrients of one food.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    /// Protein in grams.
    pub protein: f64,
    /// Carbohydrates in grams.
    pub carbs: f64,
    /// Fat in grams.
    pub fats: f64,
    /// Energy in kcal.
    pub calories: f64,
}

impl Macros {
    /// Build from the four values.
    pub const fn new(protein: f64, carbs: f64, fats: f64, calories: f64) -> Self {
        Self {
            protein,
            carbs,
            fats,
            calories,
        }
    }

    /// Whether every value is zero.
    pub fn is_empty(&self) -> bool {
        [self.protein, self.carbs, self.fats, self.calories]
            .iter()
            .all(|v| *v == 0.0)
    }
}

/// Micronutrients of one food.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Micronutrients {
    /// mg.
    pub iron: f64,
    /// mg.
    pub calcium: f64,
    /// IU.
    pub vitamin_a: f64,
    /// mg.
    pub vitamin_c: f64,
    /// mcg.
    pub vitamin_b12: f64,
    /// mcg.
    pub folates: f64,
    /// mg.
    pub potassium: f64,
}

/// `(Protein: 6g, Carbs: 0.6g, Fats: 5g, Calories: 70)`, or the
/// unavailable notice.
pub fn format_macros(macros: Option<&Macros>) -> String {
    let Some(m) = macros else {
        return MACROS_UNAVAILABLE.to_owned();
    };
    format!(
        "(Protein: {}g, Carbs: {}g, Fats: {}g, Calories: {:.0})",
        amount(m.protein),
        amount(m.carbs),
        amount(m.fats),
        m.calories.trunc()
    )
}

/// `(Iron: 1.2mg, Calcium: 50mg, Vit.A: 160IU, ...)`, or the unavailable
/// notice.
pub fn format_micronutrients(micros: Option<&Micronutrients>) -> String {
    let Some(m) = micros else {
        return MICROS_UNAVAILABLE.to_owned();
    };
    format!(
        "(Iron: {}mg, Calcium: {}mg, Vit.A: {}IU, Vit.C: {}mg, B12: {}mcg, Folate: {}mcg, K: {}mg)",
        amount(m.iron),
        amount(m.calcium),
        amount(m.vitamin_a),
        amount(m.vitamin_c),
        amount(m.vitamin_b12),
        amount(m.folates),
        amount(m.potassium)
    )
}

/// Round half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Render without trailing zeros: `6`, `0.6`, `4.25`.
fn amount(value: f64) -> String {
    let text = format!("{:.2}", round_to(value, 2));
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// Both lookups behind one handle, with fallbacks applied.
#[derive(Debug, Clone)]
pub struct NutritionService {
    usda: Option<UsdaClient>,
    open_food_facts: OpenFoodFactsClient,
}

impl NutritionService {
    /// Build from config. Without a USDA key only the fallback macro table
    /// is consulted.
    pub fn new(config: &NutritionConfig) -> Self {
        let usda = config
            .usda_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|key| UsdaClient::new(key, &config.usda_base_url));
        if usda.is_none() {
            warn!("USDA_API_KEY not set; macro lookups use the built-in table only");
        }
        Self {
            usda,
            open_food_facts: OpenFoodFactsClient::new(&config.open_food_facts_base_url),
        }
    }

    /// Macros for `food`. API failures degrade to the fallback table.
    pub async fn macros(&self, food: &str) -> Option<Macros> {
        let Some(usda) = &self.usda else {
            return fallback::fallback_macros(food);
        };
        match usda.food_macros(food).await {
            Ok(found) => found,
            Err(e) => {
                warn!(food, error = %e, "USDA lookup failed");
                fallback::fallback_macros(food)
            }
        }
    }

    /// Micronutrients for `food`. API failures yield `None`.
    pub async fn micronutrients(&self, food: &str) -> Option<Micronutrients> {
        match self.open_food_facts.micronutrients(food).await {
            Ok(found) => found,
            Err(e) => {
                warn!(food, error = %e, "Open Food Facts lookup failed");
                None
            }
        }
    }

    /// Two-line summary used by `/nutrition` and the CLI.
    pub async fn report(&self, food: &str) -> String {
        let (macros, micros) = tokio::join!(self.macros(food), self.micronutrients(food));
        format!(
            "{food}\nMacros: {}\nMicronutrients: {}",
            format_macros(macros.as_ref()),
            format_micronutrients(micros.as_ref())
        )
    }
}
