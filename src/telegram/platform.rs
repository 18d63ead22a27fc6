//! [`ChatPlatform`] over the Telegram Bot API.
//!
//! Threads are forum topics; a [`ThreadKey`] without a topic addresses the
//! chat itself.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode, ThreadId};

use super::ui;
use crate::coach::{ChatPlatform, Origin, PlatformError, ThreadKey};

/// Light blue, one of the six topic icon colors Telegram accepts.
const TOPIC_ICON_COLOR: u32 = 0x6F_B9_F0;

/// Telegram implementation of the chat seam.
#[derive(Debug, Clone)]
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    /// Wrap a bot handle.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn topic(at: &ThreadKey) -> Option<ThreadId> {
    at.thread_id.map(|id| ThreadId(MessageId(id)))
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn open_thread(&self, origin: &Origin, name: &str) -> Result<ThreadKey, PlatformError> {
        if !origin.topics_enabled {
            return Err(PlatformError::Unavailable(
                "chat has no forum topics".to_owned(),
            ));
        }
        let chat_id = origin.location.chat_id;
        let created = self
            .bot
            .create_forum_topic(ChatId(chat_id), name, TOPIC_ICON_COLOR, "")
            .await?;
        Ok(ThreadKey::topic(chat_id, created.thread_id.0 .0))
    }

    async fn send_text(&self, at: &ThreadKey, text: &str) -> Result<(), PlatformError> {
        let mut request = self.bot.send_message(ChatId(at.chat_id), text);
        if let Some(thread) = topic(at) {
            request = request.message_thread_id(thread);
        }
        request.await?;
        Ok(())
    }

    async fn send_html(&self, at: &ThreadKey, html: &str) -> Result<(), PlatformError> {
        let mut request = self
            .bot
            .send_message(ChatId(at.chat_id), html)
            .parse_mode(ParseMode::Html);
        if let Some(thread) = topic(at) {
            request = request.message_thread_id(thread);
        }
        request.await?;
        Ok(())
    }

    async fn send_document(
        &self,
        at: &ThreadKey,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), PlatformError> {
        let file = InputFile::memory(bytes).file_name(file_name.to_owned());
        let mut request = self.bot.send_document(ChatId(at.chat_id), file);
        if let Some(thread) = topic(at) {
            request = request.message_thread_id(thread);
        }
        request.await?;
        Ok(())
    }

    async fn send_checkin(&self, at: &ThreadKey, html: &str) -> Result<i32, PlatformError> {
        let mut request = self
            .bot
            .send_message(ChatId(at.chat_id), html)
            .parse_mode(ParseMode::Html)
            .reply_markup(ui::empty_checkin_keyboard());
        if let Some(thread) = topic(at) {
            request = request.message_thread_id(thread);
        }
        let sent = request.await?;
        Ok(sent.id.0)
    }
}
