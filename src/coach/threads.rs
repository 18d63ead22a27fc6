//! In-memory thread bookkeeping.
//!
//! Two maps, both process-local and lost on restart:
//! - thread -> assistant conversation and the user who started it, used to
//!   route follow-ups
//! - (chat, user) -> thread, so a user's later commands reuse their topic
//!
//! A forum topic belongs to its conversation, so anyone posting there is
//! answered. A bare chat is shared, so only the starter's messages are
//! forwarded.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::ThreadKey;
use crate::assistant::ConversationId;

#[derive(Debug, Clone)]
struct Binding {
    conversation: ConversationId,
    starter: u64,
}

#[derive(Debug, Default)]
struct Inner {
    conversations: HashMap<ThreadKey, Binding>,
    owners: HashMap<(i64, u64), ThreadKey>,
}

/// Thread to conversation and owner mappings.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    inner: Mutex<Inner>,
}

impl ThreadRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `thread` at `conversation` started by `starter`, replacing any
    /// earlier binding.
    pub async fn bind(&self, thread: ThreadKey, conversation: ConversationId, starter: u64) {
        let mut inner = self.inner.lock().await;
        let binding = Binding {
            conversation,
            starter,
        };
        if let Some(previous) = inner.conversations.insert(thread, binding) {
            tracing::debug!(%thread, previous = %previous.conversation, "thread rebound to new conversation");
        }
    }

    /// Conversation bound to `thread`, if any.
    pub async fn conversation(&self, thread: &ThreadKey) -> Option<ConversationId> {
        self.inner
            .lock()
            .await
            .conversations
            .get(thread)
            .map(|b| b.conversation.clone())
    }

    /// Conversation a message from `user` in `thread` continues.
    ///
    /// Topics accept everyone; a bare chat only its starter.
    pub async fn route(&self, thread: &ThreadKey, user: u64) -> Option<ConversationId> {
        let inner = self.inner.lock().await;
        let binding = inner.conversations.get(thread)?;
        (thread.thread_id.is_some() || binding.starter == user)
            .then(|| binding.conversation.clone())
    }

    /// Thread previously opened for `user` in `chat_id`.
    pub async fn owned_thread(&self, chat_id: i64, user: u64) -> Option<ThreadKey> {
        self.inner.lock().await.owners.get(&(chat_id, user)).copied()
    }

    /// Remember that `thread` belongs to `user`.
    pub async fn set_owner(&self, user: u64, thread: ThreadKey) {
        self.inner
            .lock()
            .await
            .owners
            .insert((thread.chat_id, user), thread);
    }
}

/// `https://t.me/c/...` link to a forum topic in a supergroup.
///
/// Returns `None` for chats that are not supergroups or keys without a
/// topic.
pub fn thread_link(thread: &ThreadKey) -> Option<String> {
    let topic = thread.thread_id?;
    let chat = thread.chat_id.to_string();
    let internal = chat.strip_prefix("-100")?;
    Some(format!("https://t.me/c/{internal}/{topic}"))
}
