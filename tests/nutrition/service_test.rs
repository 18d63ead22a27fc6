//! Nutrition service tests: fallbacks and report formatting.

use repbyrep::config::NutritionConfig;
use repbyrep::nutrition::{NutritionService, MACROS_UNAVAILABLE, MICROS_UNAVAILABLE};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, usda_key: Option<&str>) -> NutritionConfig {
    NutritionConfig {
        usda_api_key: usda_key.map(str::to_owned),
        usda_base_url: server.uri(),
        open_food_facts_base_url: server.uri(),
    }
}

#[tokio::test]
async fn without_a_key_macros_come_from_the_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = NutritionService::new(&config(&server, None));
    let report = service.report("egg").await;
    assert_eq!(
        report,
        "egg\n\
         Macros: (Protein: 6g, Carbs: 0.6g, Fats: 5g, Calories: 70)\n\
         Micronutrients: (Iron: 1.2mg, Calcium: 50mg, Vit.A: 160IU, Vit.C: 0mg, B12: 0.6mcg, Folate: 47mcg, K: 126mg)"
    );
}

#[tokio::test]
async fn api_failures_degrade_to_table_or_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = NutritionService::new(&config(&server, Some("usda-key")));
    assert!(service.macros("white rice").await.is_some());

    let report = service.report("quinoa").await;
    assert_eq!(
        report,
        format!("quinoa\nMacros: {MACROS_UNAVAILABLE}\nMicronutrients: {MICROS_UNAVAILABLE}")
    );
}

#[tokio::test]
async fn keyed_service_prefers_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "foods": [{
                "description": "Eggs, whole, raw",
                "foodNutrients": [
                    {"nutrientName": "Protein", "unitName": "G", "value": 12.6},
                    {"nutrientName": "Energy", "unitName": "KCAL", "value": 143.0}
                ]
            }]
        })))
        .mount(&server)
        .await;

    let service = NutritionService::new(&config(&server, Some("usda-key")));
    let macros = service.macros("egg").await.expect("macros");
    assert_eq!(macros.protein, 12.6);
    assert_eq!(macros.calories, 143.0);
}
