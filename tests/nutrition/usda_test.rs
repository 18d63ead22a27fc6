//! FoodData Central client tests.

use repbyrep::nutrition::usda::{macros_from_nutrients, FoodNutrient};
use repbyrep::nutrition::{LookupError, Macros, UsdaClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn nutrient(name: &str, unit: &str, value: f64) -> FoodNutrient {
    FoodNutrient {
        nutrient_name: name.to_owned(),
        unit_name: unit.to_owned(),
        value,
    }
}

#[tokio::test]
async fn best_match_macros_are_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("api_key", "usda-key"))
        .and(query_param("query", "lentil soup"))
        .and(query_param("pageSize", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalHits": 12,
            "foods": [{
                "description": "Soup, lentil",
                "foodNutrients": [
                    {"nutrientName": "Protein", "unitName": "G", "value": 3.64},
                    {"nutrientName": "Carbohydrate, by difference", "unitName": "G", "value": 8.19},
                    {"nutrientName": "Fiber, total dietary", "unitName": "G", "value": 3.0},
                    {"nutrientName": "Total lipid (fat)", "unitName": "G", "value": 1.1},
                    {"nutrientName": "Energy", "unitName": "kJ", "value": 250.0},
                    {"nutrientName": "Energy", "unitName": "KCAL", "value": 58.0}
                ]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = UsdaClient::new("usda-key", &server.uri());
    let macros = client.food_macros("lentil soup").await.expect("lookup");
    assert_eq!(macros, Some(Macros::new(3.6, 8.2, 1.1, 58.0)));
}

#[tokio::test]
async fn empty_result_uses_the_builtin_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalHits": 0, "foods": []})))
        .mount(&server)
        .await;

    let client = UsdaClient::new("usda-key", &server.uri());
    assert_eq!(
        client.food_macros("boiled egg").await.expect("lookup"),
        Some(Macros::new(6.0, 0.6, 5.0, 70.0))
    );
    assert_eq!(client.food_macros("quinoa").await.expect("lookup"), None);
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = UsdaClient::new("bad-key", &server.uri());
    let err = client.food_macros("rice").await.expect_err("forbidden");
    assert!(matches!(err, LookupError::HttpStatus { status: 403 }));
}

#[test]
fn kilojoule_energy_is_ignored() {
    let macros = macros_from_nutrients(&[nutrient("Energy", "kJ", 400.0)]);
    assert!(macros.is_empty());

    let macros = macros_from_nutrients(&[nutrient("Energy", "KCAL", 95.4)]);
    assert_eq!(macros.calories, 95.4);
}

#[test]
fn client_debug_hides_the_key() {
    let client = UsdaClient::new("super-secret", "https://api.nal.usda.gov/fdc/v1");
    assert!(!format!("{client:?}").contains("super-secret"));
}
