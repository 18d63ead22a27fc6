//! PDF export tests.

use repbyrep::mealplan::render::{pdf_safe, wrap_text};
use repbyrep::mealplan::{pdf_file_name, render_meal_plan, RenderError};

const PLAN: &str = "### Total Daily Macronutrients
Protein: 150g
Carbs: 200g

Suhoor: overnight oats, 3 eggs | 40g protein

Iftar: 3 dates, lentil soup, salmon | 55g protein

### Total Micronutrients
Iron: 18mg

### Tips
Sleep 7 hours 😴";

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn renders_a_pdf_document() {
    let bytes = render_meal_plan(PLAN, "Aisha").expect("render");
    assert!(bytes.starts_with(b"%PDF"));
    assert!(contains(&bytes, b"%%EOF"));
}

#[test]
fn plan_without_sections_still_renders_title_and_footer() {
    let bytes = render_meal_plan("Nothing recognizable here.", "Aisha").expect("render");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn blank_plan_is_rejected() {
    assert!(matches!(
        render_meal_plan(" \n\n ", "Aisha"),
        Err(RenderError::EmptyPlan)
    ));
}

#[test]
fn long_plans_grow_onto_more_pages() {
    let short = render_meal_plan(PLAN, "Aisha").expect("short");
    let meals: Vec<String> = (1..=60)
        .map(|i| format!("Meal {i}: rice, chicken, salad, olive oil and fruit | {i}g protein"))
        .collect();
    let long_plan = format!("{PLAN}\n\n{}", meals.join("\n\n"));
    let long = render_meal_plan(&long_plan, "Aisha").expect("long");
    assert!(long.starts_with(b"%PDF"));
    assert!(long.len() > short.len());
}

#[test]
fn file_name_uses_the_display_name() {
    assert_eq!(pdf_file_name("Aisha"), "Meal Plan for Aisha.pdf");
    assert_eq!(pdf_file_name(" A:B "), "Meal Plan for AB.pdf");
}

#[test]
fn wrapped_text_is_latin1_safe() {
    let lines = wrap_text("Stay hydrated 💧 \u{2013} drink water", 12.0, 200.0);
    assert_eq!(lines, vec!["Stay hydrated - drink water".to_owned()]);
    assert_eq!(pdf_safe("\u{2026}"), "...");
}
