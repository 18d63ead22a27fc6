//! Outbound message shaping.
//!
//! LLM replies routinely exceed the platform's per-message limit; the
//! [`split`] module chunks them so nothing is lost on the way out.

pub mod split;

pub use split::{split_message, SplitLimits, CONTINUED_MARKER};
