//! In-memory chat platform and assistant used by the coach tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use repbyrep::assistant::{Assistant, AssistantError, ConversationId};
use repbyrep::coach::{
    ChatPlatform, Coach, CoachSettings, Member, Origin, PlatformError, ThreadKey,
};
use repbyrep::config::NutritionConfig;
use repbyrep::nutrition::NutritionService;

/// Supergroup id with the `-100` prefix so topic links resolve.
pub const FORUM_CHAT: i64 = -1_001_234_567_890;
/// Topic id handed out by the first `open_thread`.
pub const FIRST_TOPIC: i32 = 77;

/// One outbound operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(ThreadKey, String),
    Html(ThreadKey, String),
    Document(ThreadKey, String, Vec<u8>),
    CheckIn(ThreadKey, String),
}

/// Records every send; opens numbered topics unless told not to.
pub struct FakePlatform {
    sent: Mutex<Vec<Sent>>,
    next_topic: Mutex<Option<i32>>,
    opened: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn with_topics() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            next_topic: Mutex::new(Some(FIRST_TOPIC)),
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn without_topics() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            next_topic: Mutex::new(None),
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn texts_at(&self, at: ThreadKey) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(key, text) | Sent::Html(key, text) if key == at => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened lock").clone()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().expect("sent lock").push(sent);
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn open_thread(&self, origin: &Origin, name: &str) -> Result<ThreadKey, PlatformError> {
        let mut next = self.next_topic.lock().expect("topic lock");
        let Some(id) = *next else {
            return Err(PlatformError::Unavailable("no topics".to_owned()));
        };
        *next = Some(id.saturating_add(1));
        self.opened.lock().expect("opened lock").push(name.to_owned());
        Ok(ThreadKey::topic(origin.location.chat_id, id))
    }

    async fn send_text(&self, at: &ThreadKey, text: &str) -> Result<(), PlatformError> {
        self.record(Sent::Text(*at, text.to_owned()));
        Ok(())
    }

    async fn send_html(&self, at: &ThreadKey, html: &str) -> Result<(), PlatformError> {
        self.record(Sent::Html(*at, html.to_owned()));
        Ok(())
    }

    async fn send_document(
        &self,
        at: &ThreadKey,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), PlatformError> {
        self.record(Sent::Document(*at, file_name.to_owned(), bytes));
        Ok(())
    }

    async fn send_checkin(&self, at: &ThreadKey, html: &str) -> Result<i32, PlatformError> {
        self.record(Sent::CheckIn(*at, html.to_owned()));
        Ok(1000)
    }
}

/// Assistant that answers every prompt with the same text, or always fails.
pub struct FakeAssistant {
    reply: Option<String>,
    follow_up_fails: bool,
    conversations: AtomicUsize,
    prompts: Mutex<Vec<(ConversationId, String)>>,
}

impl FakeAssistant {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_owned()),
            follow_up_fails: false,
            conversations: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            follow_up_fails: true,
            conversations: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Starts conversations fine but fails every later message.
    pub fn flaky_follow_ups(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_owned()),
            follow_up_fails: true,
            conversations: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<(ConversationId, String)> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl Assistant for FakeAssistant {
    async fn open_conversation(&self) -> Result<ConversationId, AssistantError> {
        if self.reply.is_none() {
            return Err(AssistantError::Timeout(Duration::from_secs(120)));
        }
        let n = self.conversations.fetch_add(1, Ordering::SeqCst);
        Ok(ConversationId::new(format!("thread_{n}")))
    }

    async fn reply(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<String, AssistantError> {
        let mut prompts = self.prompts.lock().expect("prompts lock");
        let is_follow_up = prompts.iter().any(|(c, _)| c == conversation);
        prompts.push((conversation.clone(), text.to_owned()));
        drop(prompts);

        match &self.reply {
            Some(_) if is_follow_up && self.follow_up_fails => Err(AssistantError::EmptyReply),
            Some(reply) => Ok(reply.clone()),
            None => Err(AssistantError::EmptyReply),
        }
    }
}

pub fn settings() -> CoachSettings {
    CoachSettings {
        intake_timeout: Duration::from_secs(5),
        ..CoachSettings::default()
    }
}

pub fn coach(
    platform: &Arc<FakePlatform>,
    assistant: &Arc<FakeAssistant>,
    settings: CoachSettings,
) -> Arc<Coach> {
    let platform: Arc<dyn ChatPlatform> = platform.clone();
    let assistant: Arc<dyn Assistant> = assistant.clone();
    Arc::new(Coach::new(
        platform,
        assistant,
        NutritionService::new(&NutritionConfig::default()),
        settings,
    ))
}

pub fn forum_origin() -> Origin {
    Origin {
        location: ThreadKey::chat(FORUM_CHAT),
        topics_enabled: true,
    }
}

pub fn plain_origin() -> Origin {
    Origin {
        location: ThreadKey::chat(FORUM_CHAT),
        topics_enabled: false,
    }
}

pub fn omar() -> Member {
    Member {
        user_id: 7,
        display_name: "Omar".to_owned(),
    }
}

pub fn first_topic() -> ThreadKey {
    ThreadKey::topic(FORUM_CHAT, FIRST_TOPIC)
}
