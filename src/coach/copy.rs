//! Fixed chat copy.

/// `/help` reply (HTML).
pub const HELP: &str = "Commands: /help, /rift_taps, /mealplan, /ask &lt;question&gt;, \
/nutrition &lt;food&gt;. Chat in threads! Note: I don't have web search access.";

/// First message in a RIFT & TAPS thread.
pub const RIFT_TAPS_OPENING: &str =
    "Let's explore RIFT & TAPS! 💪\nPlease wait a few seconds for processing.";
/// After the RIFT & TAPS explanation.
pub const RIFT_TAPS_FOLLOW_UP: &str =
    "Feel free to ask any follow-up questions about RIFT & TAPS! 👓";

/// Second message in a question thread.
pub const ASK_SEARCHING: &str = "Here's what I found based on Team Akib's guide...";
/// After an answer.
pub const ASK_FOLLOW_UP: &str = "Feel free to ask follow-up questions! I'm here to help! 💪";

/// Intake timed out.
pub const INTAKE_TIMEOUT: &str = "Response time exceeded. Please try again.";
/// Before the plan is requested.
pub const MEAL_PLAN_GENERATING: &str = "Generating your personalized meal plan... 🔄";
/// After the plan.
pub const MEAL_PLAN_FOLLOW_UP: &str = "Feel free to ask questions about your meal plan! 🍽️";
/// PDF export failed.
pub const MEAL_PLAN_PDF_FAILED: &str =
    "I encountered an error generating the PDF. Here's your meal plan in text format:";

/// A follow-up could not be answered.
pub const FORWARD_FAILED: &str =
    "Sorry, I encountered an error processing your message. Please try again.";
/// A command's first assistant call failed.
pub const ASSISTANT_FAILED: &str =
    "Sorry, I couldn't reach the coaching assistant right now. Please try again.";

/// Main-chat pointer to a RIFT & TAPS thread; `{thread}` is a link.
pub fn rift_taps_created(thread: &str) -> String {
    format!("Created a thread to explain RIFT &amp; TAPS. Check {thread}! 💪")
}

/// Main-chat pointer to a question thread.
pub fn ask_created(thread: &str) -> String {
    format!("Created a thread for your question. Check {thread}! 🤔")
}

/// Main-chat pointer to a meal plan thread.
pub fn meal_plan_created(thread: &str) -> String {
    format!("Created a thread for your meal plan! Check {thread}")
}

/// Greeting for a new member; `mention` is HTML.
pub fn welcome(mention: &str, checkin_time: &str) -> String {
    format!("Welcome {mention} to Rep by Rep! 💪 Use /help to start. Check-ins at {checkin_time}!")
}
