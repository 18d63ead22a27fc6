//! HTML formatting and inline keyboard helpers for Telegram messages.
//!
//! Formatted output uses HTML parse mode (never MarkdownV2). Assistant
//! replies are sent as plain text and need none of this.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::coach::checkin::CheckInMark;

/// Escape special HTML characters in user-provided text.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inline link mentioning a user by id.
pub fn user_mention(user_id: u64, name: &str) -> String {
    format!("<a href=\"tg://user?id={user_id}\">{}</a>", escape_html(name))
}

/// Check-in answer buttons, with tap counts once anyone has answered.
pub fn checkin_keyboard(counts: &[(CheckInMark, usize)]) -> InlineKeyboardMarkup {
    let row = counts
        .iter()
        .map(|(mark, count)| {
            let label = if *count == 0 {
                format!("{} {}", mark.emoji(), mark.label())
            } else {
                format!("{} {} ({count})", mark.emoji(), mark.label())
            };
            InlineKeyboardButton::callback(label, mark.callback_data())
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

/// Buttons for a fresh check-in.
pub fn empty_checkin_keyboard() -> InlineKeyboardMarkup {
    checkin_keyboard(&CheckInMark::ALL.map(|mark| (mark, 0)))
}
