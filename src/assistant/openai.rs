//! OpenAI Assistants API backend (`/v1/threads`, `/runs`, `/messages`).
//!
//! One chat thread maps to one Assistants "thread"; each reply is a run that
//! is polled until it reaches a terminal status.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::{check_http_response, sanitize, Assistant, AssistantError, ConversationId};

/// Beta header value selecting the v2 Assistants API.
const ASSISTANTS_BETA: &str = "assistants=v2";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Connection and timing settings for [`OpenAiAssistant`].
#[derive(Clone)]
pub struct AssistantSettings {
    /// API base URL including the version segment, without trailing slash.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Assistant that runs on every conversation.
    pub assistant_id: String,
    /// Upper bound on a single run.
    pub run_timeout: Duration,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Conversation creation attempts before giving up.
    pub create_attempts: u32,
    /// Delay between creation attempts.
    pub retry_delay: Duration,
}

impl std::fmt::Debug for AssistantSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"__REDACTED__")
            .field("assistant_id", &self.assistant_id)
            .field("run_timeout", &self.run_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("create_attempts", &self.create_attempts)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Thread object returned by `POST /threads`.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ThreadObject {
    /// Thread identifier.
    pub id: String,
}

/// Body of `POST /threads/{id}/messages`.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    /// Always `user`.
    pub role: &'a str,
    /// Message text.
    pub content: &'a str,
}

/// Body of `POST /threads/{id}/runs`.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct CreateRunRequest<'a> {
    /// Assistant to run.
    pub assistant_id: &'a str,
}

/// Run object returned by run creation and retrieval.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct RunObject {
    /// Run identifier.
    pub id: String,
    /// Current status.
    pub status: RunStatus,
    /// Error details for failed runs.
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Lifecycle status of a run.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start.
    Queued,
    /// Generating.
    InProgress,
    /// Waiting for tool outputs, which this bot never supplies.
    RequiresAction,
    /// Cancellation requested.
    Cancelling,
    /// Cancelled.
    Cancelled,
    /// Failed.
    Failed,
    /// Finished successfully.
    Completed,
    /// Stopped early (token limits).
    Incomplete,
    /// Expired before finishing.
    Expired,
    /// Any status this client does not know.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether polling should continue.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::Queued | Self::InProgress | Self::Cancelling | Self::Unknown
        )
    }

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

/// Error attached to a failed run.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct RunError {
    /// Error code.
    #[serde(default)]
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Page of thread messages.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct MessageList {
    /// Messages in the requested order.
    pub data: Vec<ThreadMessage>,
}

/// A message in a thread.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ThreadMessage {
    /// `user` or `assistant`.
    pub role: String,
    /// Content blocks.
    #[serde(default)]
    pub content: Vec<MessageBlock>,
}

/// A content block of a thread message.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBlock {
    /// Text block.
    Text {
        /// Text payload.
        text: TextBlock,
    },
    /// Images, files, and anything else.
    #[serde(other)]
    Other,
}

/// Text payload of a message block.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct TextBlock {
    /// Raw text, possibly containing citation markers.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Parsing (pub for integration testing)
// ---------------------------------------------------------------------------

/// Extract the assistant's reply text from a message list body.
///
/// Joins every assistant text block in list order with a blank line.
///
/// # Errors
///
/// Returns `AssistantError::Parse` on malformed JSON and
/// `AssistantError::EmptyReply` when no assistant text is present.
#[doc(hidden)]
pub fn parse_reply(body: &str) -> Result<String, AssistantError> {
    let list: MessageList =
        serde_json::from_str(body).map_err(|e| AssistantError::Parse(e.to_string()))?;

    let texts: Vec<String> = list
        .data
        .into_iter()
        .filter(|m| m.role == "assistant")
        .flat_map(|m| m.content)
        .filter_map(|block| match block {
            MessageBlock::Text { text } => Some(text.value),
            MessageBlock::Other => None,
        })
        .filter(|t| !t.trim().is_empty())
        .collect();

    if texts.is_empty() {
        return Err(AssistantError::EmptyReply);
    }
    Ok(texts.join("\n\n"))
}

fn parse_json<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, AssistantError> {
    serde_json::from_str(body).map_err(|e| AssistantError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Assistants API client.
#[derive(Debug)]
pub struct OpenAiAssistant {
    settings: AssistantSettings,
    client: reqwest::Client,
    /// One lock per conversation: the API rejects messages while a run is active.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OpenAiAssistant {
    /// Create a client with the given settings.
    pub fn new(settings: AssistantSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.settings.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.settings.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    async fn create_thread(&self) -> Result<ConversationId, AssistantError> {
        let response = self
            .post("threads")
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let body = check_http_response(response).await?;
        let thread: ThreadObject = parse_json(&body)?;
        Ok(ConversationId::new(thread.id))
    }

    async fn add_message(&self, thread: &str, text: &str) -> Result<(), AssistantError> {
        debug!(thread, "adding message to thread");
        let response = self
            .post(&format!("threads/{thread}/messages"))
            .json(&CreateMessageRequest {
                role: "user",
                content: text,
            })
            .send()
            .await?;
        check_http_response(response).await?;
        Ok(())
    }

    async fn create_run(&self, thread: &str) -> Result<RunObject, AssistantError> {
        debug!(thread, "starting assistant run");
        let response = self
            .post(&format!("threads/{thread}/runs"))
            .json(&CreateRunRequest {
                assistant_id: &self.settings.assistant_id,
            })
            .send()
            .await?;
        let body = check_http_response(response).await?;
        parse_json(&body)
    }

    async fn retrieve_run(&self, thread: &str, run: &str) -> Result<RunObject, AssistantError> {
        let response = self
            .get(&format!("threads/{thread}/runs/{run}"))
            .send()
            .await?;
        let body = check_http_response(response).await?;
        parse_json(&body)
    }

    /// Poll until the run leaves the pending states.
    async fn wait_for_run(&self, thread: &str, mut run: RunObject) -> Result<(), AssistantError> {
        loop {
            match run.status {
                RunStatus::Completed => return Ok(()),
                status if status.is_pending() => {
                    tokio::time::sleep(self.settings.poll_interval).await;
                    run = self.retrieve_run(thread, &run.id).await?;
                }
                status => {
                    error!(thread, run = %run.id, status = status.as_str(), "assistant run failed");
                    return Err(AssistantError::RunFailed {
                        status: status.as_str().to_owned(),
                        detail: run
                            .last_error
                            .map(|e| format!("{}: {}", e.code, e.message)),
                    });
                }
            }
        }
    }

    async fn run_messages(&self, thread: &str, run: &str) -> Result<String, AssistantError> {
        let response = self
            .get(&format!("threads/{thread}/messages"))
            .query(&[("run_id", run), ("order", "asc")])
            .send()
            .await?;
        let body = check_http_response(response).await?;
        parse_reply(&body)
    }

    async fn conversation_lock(&self, conversation: &ConversationId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(conversation.as_str().to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Drop the map entry once no other caller holds or waits on `lock`.
    async fn release_lock(&self, conversation: &ConversationId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // The map and `lock` itself.
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(conversation.as_str());
        }
    }

    /// One message and run on `thread`; the caller holds its lock.
    async fn run_turn(&self, thread: &str, text: &str) -> Result<String, AssistantError> {
        self.add_message(thread, text).await?;
        let run = self.create_run(thread).await?;
        let run_id = run.id.clone();

        let timeout = self.settings.run_timeout;
        match tokio::time::timeout(timeout, self.wait_for_run(thread, run)).await {
            Ok(result) => result?,
            Err(_) => {
                error!(thread, run = %run_id, ?timeout, "assistant run timed out");
                return Err(AssistantError::Timeout(timeout));
            }
        }

        let raw = self.run_messages(thread, &run_id).await?;
        let reply = sanitize::tidy_reply(&raw);
        debug!(thread, chars = reply.chars().count(), "received assistant reply");
        Ok(reply)
    }
}

#[async_trait::async_trait]
impl Assistant for OpenAiAssistant {
    async fn open_conversation(&self) -> Result<ConversationId, AssistantError> {
        let attempts = self.settings.create_attempts.max(1);
        let mut attempt: u32 = 1;
        loop {
            match self.create_thread().await {
                Ok(id) => {
                    debug!(conversation = %id, "created assistant thread");
                    return Ok(id);
                }
                Err(e) if attempt < attempts => {
                    warn!(attempt, error = %e, "thread creation failed, retrying");
                    tokio::time::sleep(self.settings.retry_delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(e) => {
                    error!(attempts, error = %e, "failed to create thread");
                    return Err(e);
                }
            }
        }
    }

    async fn reply(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<String, AssistantError> {
        let lock = self.conversation_lock(conversation).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_turn(conversation.as_str(), text).await
        };
        self.release_lock(conversation, lock).await;
        result
    }
}
