//! One-shot waits for a specific user's next message in a thread.

use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};

use super::ThreadKey;

/// Pending intake replies keyed by thread and user.
#[derive(Debug, Default)]
pub struct ReplyWaiters {
    pending: Mutex<HashMap<(ThreadKey, u64), oneshot::Sender<String>>>,
}

impl ReplyWaiters {
    /// No pending waits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `user`'s next message in `thread`.
    ///
    /// A second registration for the same pair drops the first sender, so
    /// the earlier receiver resolves with an error.
    pub async fn register(&self, thread: ThreadKey, user: u64) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert((thread, user), tx);
        rx
    }

    /// Hand `text` to a waiter. Returns `true` if one consumed it.
    pub async fn deliver(&self, thread: ThreadKey, user: u64, text: &str) -> bool {
        let Some(tx) = self.pending.lock().await.remove(&(thread, user)) else {
            return false;
        };
        tx.send(text.to_owned()).is_ok()
    }

    /// Drop a wait, e.g. after it timed out.
    pub async fn cancel(&self, thread: ThreadKey, user: u64) {
        self.pending.lock().await.remove(&(thread, user));
    }

    /// Whether a wait is pending for the pair.
    pub async fn is_waiting(&self, thread: ThreadKey, user: u64) -> bool {
        self.pending.lock().await.contains_key(&(thread, user))
    }
}
