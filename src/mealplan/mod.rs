//! Meal plan intake and export.
//!
//! The `/mealplan` flow collects two rounds of comma-separated answers,
//! turns them into a [`UserProfile`], and later renders the assistant's plan
//! as a PDF through [`render`]. Section scraping lives in [`sections`].

use serde::{Deserialize, Serialize};

pub mod render;
pub mod sections;

pub use render::{pdf_file_name, render_meal_plan, PdfRenderer, RenderError};
pub use sections::{parse_sections, MealLine, PlanSection};

/// Number of answers expected in each intake round.
pub const ANSWERS_PER_ROUND: usize = 8;

/// First intake round: who the plan is for.
pub const PROFILE_QUESTIONS: &str = "Let's create your personalized meal plan 📝\n\
Answer these and separate by a comma:\n\
- Name\n\
- Gender (male/female)\n\
- Age\n\
- Weight (lbs)\n\
- Height (ft'in ex. 5'10)\n\
- Goal (cut/bulk/maintain)\n\
- Dietary preferences (ex. halal, vegan, Mediterranean)\n\
- Allergies?";

/// Second intake round: lifestyle details.
pub const LIFESTYLE_QUESTIONS: &str = "Great! To make a really good meal plan can you also answer these:\n\
- Duration of meal plan in months for your goals (ex. 5 months)\n\
- Daily activity (ex. 10k steps or 30 mins cardio)\n\
- Job Physical Demand (Active or Sedentary)\n\
- Health conditions or eating disorders\n\
- Previous experience with meal plans? (yes or no)\n\
- Your schedule?\n\
- Number of meals you want?\n\
- Body Fat Percentage";

/// Reply when a round has too few answers.
pub const INCOMPLETE_ANSWERS: &str =
    "Please provide all required information and separate by commas.";

/// Errors turning intake answers into a profile.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IntakeError {
    /// A round had fewer than [`ANSWERS_PER_ROUND`] answers.
    #[error("expected {expected} answers, got {got}")]
    TooFewAnswers {
        /// Required count.
        expected: usize,
        /// Count received.
        got: usize,
    },
    /// A numeric field could not be parsed.
    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Raw answer.
        value: String,
    },
    /// Height was neither `ft'in` nor plain inches.
    #[error("height must look like 5'10 or 70, got {0:?}")]
    InvalidHeight(String),
}

/// Everything the user told the bot during intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name used in the PDF title.
    pub name: String,
    /// Gender as typed.
    pub gender: String,
    /// Age in years.
    pub age: u32,
    /// Body weight in pounds.
    pub weight_lbs: f64,
    /// Height converted to inches.
    pub height_inches: u32,
    /// cut / bulk / maintain.
    pub goal: String,
    /// Dietary preferences.
    pub diet: String,
    /// Allergies.
    pub allergies: String,
    /// Plan duration.
    pub duration: String,
    /// Daily activity.
    pub activity: String,
    /// Physical demand of the user's job.
    pub job_demand: String,
    /// Health conditions or eating disorders.
    pub health_conditions: String,
    /// Prior meal plan experience.
    pub experience: String,
    /// Daily schedule.
    pub schedule: String,
    /// Meals wanted per day.
    pub meals_count: String,
    /// Body fat percentage as typed.
    pub body_fat: String,
}

impl UserProfile {
    /// Build a profile from the two intake rounds.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError`] when a round is short or a numeric field does
    /// not parse.
    pub fn from_answers(profile: &[String], lifestyle: &[String]) -> Result<Self, IntakeError> {
        check_round(profile)?;
        check_round(lifestyle)?;

        let field = |answers: &[String], i: usize| answers.get(i).cloned().unwrap_or_default();

        let age_raw = field(profile, 2);
        let age = age_raw
            .trim()
            .parse::<u32>()
            .map_err(|_| IntakeError::InvalidNumber {
                field: "age",
                value: age_raw.clone(),
            })?;
        let weight_raw = field(profile, 3);
        let weight_lbs = parse_weight(&weight_raw).ok_or(IntakeError::InvalidNumber {
            field: "weight",
            value: weight_raw.clone(),
        })?;
        let height_inches = parse_height(&field(profile, 4))?;

        Ok(Self {
            name: field(profile, 0),
            gender: field(profile, 1),
            age,
            weight_lbs,
            height_inches,
            goal: field(profile, 5),
            diet: field(profile, 6),
            allergies: field(profile, 7),
            duration: field(lifestyle, 0),
            activity: field(lifestyle, 1),
            job_demand: field(lifestyle, 2),
            health_conditions: field(lifestyle, 3),
            experience: field(lifestyle, 4),
            schedule: field(lifestyle, 5),
            meals_count: field(lifestyle, 6),
            body_fat: field(lifestyle, 7),
        })
    }
}

/// Split one intake reply on commas, trimming each answer.
pub fn split_answers(reply: &str) -> Vec<String> {
    reply.split(',').map(|a| a.trim().to_owned()).collect()
}

/// Whether a reply carries enough answers for one round.
pub fn has_enough_answers(answers: &[String]) -> bool {
    answers.len() >= ANSWERS_PER_ROUND
}

fn check_round(answers: &[String]) -> Result<(), IntakeError> {
    if has_enough_answers(answers) {
        Ok(())
    } else {
        Err(IntakeError::TooFewAnswers {
            expected: ANSWERS_PER_ROUND,
            got: answers.len(),
        })
    }
}

fn parse_weight(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches("lbs").trim_end_matches("lb").trim();
    trimmed.parse::<f64>().ok().filter(|w| w.is_finite() && *w > 0.0)
}

/// Convert `5'10`, `5'10"` or plain inches to inches.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidHeight`] for anything else.
pub fn parse_height(raw: &str) -> Result<u32, IntakeError> {
    let invalid = || IntakeError::InvalidHeight(raw.to_owned());
    let trimmed = raw.trim();

    let Some((feet, inches)) = trimmed.split_once('\'') else {
        return trimmed.parse::<u32>().map_err(|_| invalid());
    };
    let feet = feet.trim().parse::<u32>().map_err(|_| invalid())?;
    let inches = inches.trim().trim_end_matches('"').trim();
    let inches = if inches.is_empty() {
        0
    } else {
        inches.parse::<u32>().map_err(|_| invalid())?
    };

    feet.checked_mul(12)
        .and_then(|total| total.checked_add(inches))
        .ok_or_else(invalid)
}
