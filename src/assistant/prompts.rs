//! Prompt text sent to the assistant.
//!
//! The assistant carries its own instructions (the Team Akib guide); these
//! prompts only frame each request.

use crate::mealplan::UserProfile;

/// Opening prompt for `/rift_taps`.
pub const RIFT_TAPS_PROMPT: &str = "Explain the RIFT & TAPS methodology for Ramadan training.";

/// Words that suggest a question needs live information.
const CURRENT_EVENT_KEYWORDS: &[&str] = &[
    "today",
    "current",
    "2024",
    "2025",
    "this year",
    "next year",
];

/// Note appended to answers for questions that need live information.
pub const NO_WEB_ACCESS_NOTE: &str = "Note: I don't have web access, but based on the Team Akib guide, \
this is my best answer. For current info, please check online! 🌐";

/// Whether `question` asks about something only the web could answer.
pub fn mentions_current_events(question: &str) -> bool {
    let lowered = question.to_lowercase();
    CURRENT_EVENT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Build the meal plan request for `profile`.
///
/// Section titles are spelled out because the PDF export recognizes them.
pub fn meal_plan_prompt(profile: &UserProfile) -> String {
    format!(
        "Generate a meal plan following RIFT & TAPS methodology for:\n\
         Gender: {gender}\n\
         Age: {age}\n\
         Weight: {weight} lbs\n\
         Height: {height} inches\n\
         Goal: {goal}\n\
         Diet: {diet}\n\
         Allergies: {allergies}\n\
         Plan duration: {duration}\n\
         Daily activity: {activity}\n\
         Job physical demand: {job}\n\
         Health conditions: {health}\n\
         Previous meal plan experience: {experience}\n\
         Schedule: {schedule}\n\
         Meals per day: {meals}\n\
         Body fat: {body_fat}\n\n\
         Structure the answer in sections separated by blank lines: \
         \"Total Daily Macronutrients\" (one `Nutrient: amount` per line), \
         one section per meal (Suhoor, Iftar, snacks) written as `Meal: foods | macros`, \
         \"Total Micronutrients\", and \"Tips\".",
        gender = profile.gender,
        age = profile.age,
        weight = profile.weight_lbs,
        height = profile.height_inches,
        goal = profile.goal,
        diet = profile.diet,
        allergies = profile.allergies,
        duration = profile.duration,
        activity = profile.activity,
        job = profile.job_demand,
        health = profile.health_conditions,
        experience = profile.experience,
        schedule = profile.schedule,
        meals = profile.meals_count,
        body_fat = profile.body_fat,
    )
}
