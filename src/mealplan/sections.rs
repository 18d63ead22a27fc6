//! Scrapes the assistant's free-text plan into PDF sections.
//!
//! This is keyword matching over blank-line separated blocks, not a
//! grammar. Blocks that match no keyword are left out of the document.

/// Heading of the macro table block.
const MACROS_KEYWORD: &str = "Total Daily Macronutrients";
const MICROS_KEYWORD: &str = "Micronutrients";
const TIPS_KEYWORD: &str = "Tips";
const MEAL_KEYWORDS: &[&str] = &["MEAL", "IFTAR", "SUHOOR"];

/// One line inside a meals block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealLine {
    /// `name: details`, optionally with `| macros` after the details.
    Entry {
        /// Meal heading, uppercased.
        name: String,
        /// Everything after the first `:`.
        details: String,
        /// Text after the first `|` in `details`.
        macros: Option<String>,
    },
    /// A line without a `:`.
    Note(String),
}

/// A recognized block of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSection {
    /// `(nutrient, amount)` rows.
    Macros(Vec<(String, String)>),
    /// Lines of one meals block.
    Meals(Vec<MealLine>),
    /// Micronutrient lines.
    Micronutrients(Vec<String>),
    /// Tip lines.
    Tips(Vec<String>),
}

/// Parse `plan` into the sections the PDF shows, in order.
pub fn parse_sections(plan: &str) -> Vec<PlanSection> {
    let normalized = plan.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .filter_map(|block| classify(&block.replace("###", "").replace("**", "")))
        .collect()
}

fn classify(block: &str) -> Option<PlanSection> {
    if block.contains(MACROS_KEYWORD) {
        return Some(PlanSection::Macros(macro_rows(block)));
    }
    let upper = block.to_uppercase();
    if MEAL_KEYWORDS.iter().any(|k| upper.contains(k)) {
        return Some(PlanSection::Meals(
            non_empty_lines(block).map(meal_line).collect(),
        ));
    }
    if block.contains(MICROS_KEYWORD) {
        return Some(PlanSection::Micronutrients(body_lines(block)));
    }
    if block.contains(TIPS_KEYWORD) {
        return Some(PlanSection::Tips(body_lines(block)));
    }
    None
}

fn macro_rows(block: &str) -> Vec<(String, String)> {
    block
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(nutrient, amount)| {
            let nutrient = nutrient.trim().trim_start_matches("- ").trim();
            (nutrient.to_owned(), amount.trim().to_owned())
        })
        .collect()
}

fn meal_line(line: &str) -> MealLine {
    match line.split_once(':') {
        Some((name, details)) => {
            let details = details.trim();
            let macros = details
                .split_once('|')
                .map(|(_, rest)| rest.split('|').next().unwrap_or(rest).trim().to_owned());
            MealLine::Entry {
                name: name.trim().trim_start_matches("- ").to_uppercase(),
                details: details.to_owned(),
                macros,
            }
        }
        None => MealLine::Note(line.to_owned()),
    }
}

/// Non-empty lines after the block's heading line.
fn body_lines(block: &str) -> Vec<String> {
    block
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

fn non_empty_lines(block: &str) -> impl Iterator<Item = &str> {
    block.lines().map(str::trim).filter(|l| !l.is_empty())
}
