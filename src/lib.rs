//! Rep by Rep: a Ramadan training and nutrition coach for Telegram.
//!
//! Commands open a forum topic per user, forward prompts to an OpenAI
//! assistant, and relay the reply. Follow-ups in the topic continue the same
//! assistant conversation. Meal plans are also exported as PDF.
//!
//! See `DESIGN.md` for how the modules fit together.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod assistant;
pub mod mealplan;
pub mod messaging;
pub mod nutrition;

pub mod coach;
pub mod telegram;
