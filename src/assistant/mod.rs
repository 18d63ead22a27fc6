//! LLM assistant abstraction.
//!
//! Defines the [`Assistant`] trait and the shared error type. The only
//! production backend is [`openai::OpenAiAssistant`], which drives the OpenAI
//! Assistants API (conversation, run, poll, read). The trait exists so the
//! chat flows can be exercised against an in-memory fake.
//!
//! A conversation is identified by an opaque [`ConversationId`] handed out by
//! the provider; continuing a chat thread means posting to the same id.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::mealplan::UserProfile;

pub mod openai;
pub mod prompts;
pub mod sanitize;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Provider-issued identifier of a multi-turn conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a raw provider id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw provider id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by assistant backends.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// HTTP transport failure.
    #[error("assistant request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream responded with an error status.
    #[error("assistant returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Response did not match the expected schema.
    #[error("assistant response parse error: {0}")]
    Parse(String),
    /// The run ended in a non-completed terminal state.
    #[error("assistant run ended with status {status}{}", detail_suffix(.detail))]
    RunFailed {
        /// Terminal run status.
        status: String,
        /// Provider-supplied error message, if any.
        detail: Option<String>,
    },
    /// The run did not finish in time.
    #[error("assistant run timed out after {0:?}")]
    Timeout(Duration),
    /// The run completed without producing any text.
    #[error("assistant produced an empty reply")]
    EmptyReply,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `AssistantError::Request` on transport failure and
/// `AssistantError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, AssistantError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(AssistantError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [r"sk-[A-Za-z0-9_\-]{20,}", r"sess-[A-Za-z0-9]{20,}"] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Conversational LLM backend.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// chat flow.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Open a fresh conversation.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError`] on API or network failure.
    async fn open_conversation(&self) -> Result<ConversationId, AssistantError>;

    /// Post `text` to `conversation` and wait for the assistant's reply.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError`] on API failure, failed run, or timeout.
    async fn reply(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<String, AssistantError>;

    /// Open a conversation seeded with `prompt`.
    ///
    /// # Errors
    ///
    /// Propagates failures from either step.
    async fn start_conversation(
        &self,
        prompt: &str,
    ) -> Result<(ConversationId, String), AssistantError> {
        let conversation = self.open_conversation().await?;
        let reply = self.reply(&conversation, prompt).await?;
        Ok((conversation, reply))
    }

    /// Explain the RIFT & TAPS methodology in a new conversation.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    async fn explain_rift_taps(&self) -> Result<(ConversationId, String), AssistantError> {
        tracing::info!("generating RIFT & TAPS explanation");
        self.start_conversation(prompts::RIFT_TAPS_PROMPT).await
    }

    /// Answer a free-form question in a new conversation.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    async fn ask_question(
        &self,
        question: &str,
    ) -> Result<(ConversationId, String), AssistantError> {
        tracing::info!(chars = question.chars().count(), "processing question");
        self.start_conversation(question).await
    }

    /// Generate a meal plan for `profile` in a new conversation.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    async fn generate_meal_plan(
        &self,
        profile: &UserProfile,
    ) -> Result<(ConversationId, String), AssistantError> {
        tracing::info!(goal = %profile.goal, "generating meal plan");
        self.start_conversation(&prompts::meal_plan_prompt(profile))
            .await
    }

    /// Continue an existing conversation.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    async fn continue_conversation(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<String, AssistantError> {
        tracing::debug!(%conversation, "continuing conversation");
        self.reply(conversation, text).await
    }
}
