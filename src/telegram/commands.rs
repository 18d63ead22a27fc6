//! Command parsing and the command list registered with Telegram.
//!
//! Commands use `/` or `!` as prefix and may carry a `@botname` suffix
//! (`/help@repbyrep_bot`). An unknown `/` command gets a reply; an unknown
//! `!` word is ordinary chat text.

use teloxide::types::BotCommand;

use super::ui::escape_html;

/// A recognized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/help` or `/start`.
    Help,
    /// `/rift_taps`.
    RiftTaps,
    /// `/ask <question>`.
    Ask(String),
    /// `/mealplan`.
    MealPlan,
    /// `/nutrition <food>`.
    Nutrition(String),
}

/// Result of looking at an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// A command to run.
    Command(Command),
    /// Known command missing its argument; carries the HTML usage reply.
    Usage(String),
    /// `/something` the bot does not know; carries the HTML reply.
    Unknown(String),
    /// Not a command.
    Text,
}

/// Command names with their menu descriptions.
const COMMANDS: &[(&str, &str)] = &[
    ("help", "Show available commands and usage information"),
    ("rift_taps", "Learn about the RIFT & TAPS methodology"),
    ("ask", "Ask a question about bodybuilding during Ramadan"),
    ("mealplan", "Get a personalized Ramadan meal plan"),
    ("nutrition", "Look up macros and micronutrients for a food"),
];

/// Classify `text`, accepting any `@botname` suffix.
pub fn parse(text: &str) -> Parsed {
    parse_for(text, None)
}

/// Classify `text` as seen by the bot named `bot_username`.
///
/// A command addressed to a different bot (`/help@otherbot`) is ordinary
/// text. With `None` every suffix is accepted.
pub fn parse_for(text: &str, bot_username: Option<&str>) -> Parsed {
    let trimmed = text.trim();
    let Some((prefix, without_prefix)) = trimmed
        .strip_prefix('/')
        .map(|rest| ('/', rest))
        .or_else(|| trimmed.strip_prefix('!').map(|rest| ('!', rest)))
    else {
        return Parsed::Text;
    };

    let (full_command, args) = match without_prefix.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (without_prefix, ""),
    };
    let (name, addressee) = match full_command.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (full_command, None),
    };
    if let (Some(addressee), Some(bot)) = (addressee, bot_username) {
        if !addressee.eq_ignore_ascii_case(bot) {
            return Parsed::Text;
        }
    }
    let command = name.to_lowercase();

    let parsed = match command.as_str() {
        "help" | "start" => Command::Help,
        "rift_taps" => Command::RiftTaps,
        "mealplan" => Command::MealPlan,
        "ask" if args.is_empty() => return Parsed::Usage(usage("ask", "question")),
        "ask" => Command::Ask(args.to_owned()),
        "nutrition" if args.is_empty() => return Parsed::Usage(usage("nutrition", "food")),
        "nutrition" => Command::Nutrition(args.to_owned()),
        _ if prefix == '!' || command.is_empty() => return Parsed::Text,
        other => {
            return Parsed::Unknown(format!(
                "Unknown command: /{}. Try /help.",
                escape_html(other)
            ))
        }
    };
    Parsed::Command(parsed)
}

fn usage(command: &str, argument: &str) -> String {
    format!("Usage: /{command} &lt;{argument}&gt;")
}

/// The command menu registered at startup.
pub fn bot_commands() -> Vec<BotCommand> {
    COMMANDS
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect()
}
