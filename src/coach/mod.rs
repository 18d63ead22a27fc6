//! Platform-neutral chat flows.
//!
//! [`Coach`] owns the command flows (`/rift_taps`, `/ask`, `/mealplan`,
//! `/nutrition`), follow-up routing, the member greeting, and the check-in
//! post. It talks to the chat through [`ChatPlatform`] and to the LLM through
//! [`Assistant`], so every flow runs unchanged against in-memory fakes.
//!
//! Failures while talking to the assistant are reported into the thread and
//! logged; only chat transport errors propagate to the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::assistant::prompts::{mentions_current_events, NO_WEB_ACCESS_NOTE};
use crate::assistant::{Assistant, AssistantError, ConversationId};
use crate::mealplan::{self, PdfRenderer, UserProfile};
use crate::messaging::{split_message, SplitLimits};
use crate::nutrition::NutritionService;
use crate::telegram::ui::escape_html;

pub mod checkin;
pub mod copy;
pub mod threads;
pub mod waiters;

pub use threads::{thread_link, ThreadRegistry};
pub use waiters::ReplyWaiters;

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// A place messages can be sent: a chat, or a forum topic inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    /// Chat id.
    pub chat_id: i64,
    /// Forum topic id, `None` for the chat itself.
    pub thread_id: Option<i32>,
}

impl ThreadKey {
    /// The whole chat.
    pub fn chat(chat_id: i64) -> Self {
        Self {
            chat_id,
            thread_id: None,
        }
    }

    /// A forum topic.
    pub fn topic(chat_id: i64, thread_id: i32) -> Self {
        Self {
            chat_id,
            thread_id: Some(thread_id),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.thread_id {
            Some(topic) => write!(f, "{}/{topic}", self.chat_id),
            None => write!(f, "{}", self.chat_id),
        }
    }
}

/// Where a command was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    /// Chat (and topic) the command came from.
    pub location: ThreadKey,
    /// Whether the chat supports forum topics.
    pub topics_enabled: bool,
}

/// The user who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Platform user id.
    pub user_id: u64,
    /// Name used in thread titles.
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Platform seam
// ---------------------------------------------------------------------------

/// Errors from the chat transport.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Telegram API call failed.
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    /// The operation is not possible in this chat.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Outbound chat operations used by the flows.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Open a new thread named `name` next to `origin`.
    async fn open_thread(&self, origin: &Origin, name: &str) -> Result<ThreadKey, PlatformError>;

    /// Send plain text.
    async fn send_text(&self, at: &ThreadKey, text: &str) -> Result<(), PlatformError>;

    /// Send HTML-formatted text.
    async fn send_html(&self, at: &ThreadKey, html: &str) -> Result<(), PlatformError>;

    /// Upload a file.
    async fn send_document(
        &self,
        at: &ThreadKey,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), PlatformError>;

    /// Post the check-in with its answer buttons, returning the message id.
    async fn send_checkin(&self, at: &ThreadKey, html: &str) -> Result<i32, PlatformError>;
}

// ---------------------------------------------------------------------------
// Coach
// ---------------------------------------------------------------------------

/// Tunables for [`Coach`].
#[derive(Debug, Clone)]
pub struct CoachSettings {
    /// Outbound message size limits.
    pub limits: SplitLimits,
    /// How long each intake round waits for an answer.
    pub intake_timeout: Duration,
    /// Check-in time shown in the greeting, e.g. `8 PM EST`.
    pub checkin_time_label: String,
    /// Meal plan PDF renderer.
    pub render_pdf: PdfRenderer,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            limits: SplitLimits::TELEGRAM,
            intake_timeout: Duration::from_secs(300),
            checkin_time_label: "8 PM EST".to_owned(),
            render_pdf: mealplan::render_meal_plan,
        }
    }
}

/// The bot's chat flows.
pub struct Coach {
    platform: Arc<dyn ChatPlatform>,
    assistant: Arc<dyn Assistant>,
    nutrition: NutritionService,
    threads: ThreadRegistry,
    waiters: ReplyWaiters,
    settings: CoachSettings,
}

impl Coach {
    /// Wire the flows to a platform, an assistant and the nutrition lookups.
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        assistant: Arc<dyn Assistant>,
        nutrition: NutritionService,
        settings: CoachSettings,
    ) -> Self {
        Self {
            platform,
            assistant,
            nutrition,
            threads: ThreadRegistry::new(),
            waiters: ReplyWaiters::new(),
            settings,
        }
    }

    /// Thread and conversation mappings.
    pub fn threads(&self) -> &ThreadRegistry {
        &self.threads
    }

    /// Pending intake waits.
    pub fn waiters(&self) -> &ReplyWaiters {
        &self.waiters
    }

    /// `/help`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the reply cannot be sent.
    pub async fn help(&self, origin: &Origin) -> Result<(), PlatformError> {
        self.platform.send_html(&origin.location, copy::HELP).await
    }

    /// `/rift_taps`: explain the method in the user's thread.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if a message cannot be sent.
    pub async fn rift_taps(&self, origin: &Origin, who: &Member) -> Result<(), PlatformError> {
        let name = format!("RIFT & TAPS for {}", who.display_name);
        let thread = self.get_or_create_thread(origin, who, &name).await;
        self.platform
            .send_text(&thread, copy::RIFT_TAPS_OPENING)
            .await?;

        let Some(reply) = self
            .start_in_thread(&thread, who, self.assistant.explain_rift_taps().await)
            .await?
        else {
            return Ok(());
        };
        self.send_long(&thread, &reply).await?;
        self.platform
            .send_text(&thread, copy::RIFT_TAPS_FOLLOW_UP)
            .await?;
        self.confirm(origin, &thread, &name, copy::rift_taps_created)
            .await
    }

    /// `/ask <question>`: answer in the user's thread.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if a message cannot be sent.
    pub async fn ask(
        &self,
        origin: &Origin,
        who: &Member,
        question: &str,
    ) -> Result<(), PlatformError> {
        let name = format!("Question from {}", who.display_name);
        let thread = self.get_or_create_thread(origin, who, &name).await;
        self.platform
            .send_html(
                &thread,
                &format!(
                    "Let's answer your question: <b>{}</b> ❓",
                    escape_html(question)
                ),
            )
            .await?;
        self.platform.send_text(&thread, copy::ASK_SEARCHING).await?;

        let Some(mut reply) = self
            .start_in_thread(&thread, who, self.assistant.ask_question(question).await)
            .await?
        else {
            return Ok(());
        };
        if mentions_current_events(question) {
            reply.push_str("\n\n");
            reply.push_str(NO_WEB_ACCESS_NOTE);
        }
        self.send_long(&thread, &reply).await?;
        self.platform.send_text(&thread, copy::ASK_FOLLOW_UP).await?;
        self.confirm(origin, &thread, &name, copy::ask_created).await
    }

    /// `/mealplan`: two intake rounds, then the plan as PDF and text.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if a message cannot be sent.
    pub async fn meal_plan(&self, origin: &Origin, who: &Member) -> Result<(), PlatformError> {
        let name = format!("Meal Plan for {}", who.display_name);
        let thread = self.get_or_create_thread(origin, who, &name).await;
        info!(%thread, "meal plan intake started");

        let Some(profile_answers) = self
            .intake_round(&thread, who, mealplan::PROFILE_QUESTIONS, Some((origin, name.as_str())))
            .await?
        else {
            return Ok(());
        };
        let Some(lifestyle_answers) = self
            .intake_round(&thread, who, mealplan::LIFESTYLE_QUESTIONS, None)
            .await?
        else {
            return Ok(());
        };

        let profile = match UserProfile::from_answers(&profile_answers, &lifestyle_answers) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(%thread, error = %e, "meal plan intake rejected");
                self.platform
                    .send_text(
                        &thread,
                        &format!("I couldn't read your answers ({e}). Please run /mealplan again."),
                    )
                    .await?;
                return Ok(());
            }
        };

        self.platform
            .send_text(&thread, copy::MEAL_PLAN_GENERATING)
            .await?;
        let generated = self.assistant.generate_meal_plan(&profile).await;
        let Some(plan) = self.start_in_thread(&thread, who, generated).await? else {
            return Ok(());
        };

        match (self.settings.render_pdf)(&plan, &profile.name) {
            Ok(pdf) => {
                self.platform
                    .send_document(&thread, &mealplan::pdf_file_name(&profile.name), pdf)
                    .await?;
                self.send_long(&thread, &plan).await?;
                self.platform
                    .send_text(&thread, copy::MEAL_PLAN_FOLLOW_UP)
                    .await
            }
            Err(e) => {
                error!(%thread, error = %e, "error generating PDF");
                self.platform
                    .send_text(&thread, copy::MEAL_PLAN_PDF_FAILED)
                    .await?;
                self.send_long(&thread, &plan).await
            }
        }
    }

    /// `/nutrition <food>`: lookup summary in the chat it was asked in.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the reply cannot be sent.
    pub async fn nutrition(&self, origin: &Origin, food: &str) -> Result<(), PlatformError> {
        let report = self.nutrition.report(food).await;
        self.platform.send_text(&origin.location, &report).await
    }

    /// Route an ordinary text message.
    ///
    /// Pending intake answers win; otherwise text in a thread with a
    /// conversation is forwarded to the assistant and the reply relayed. In a
    /// chat without topics only the user who started the conversation is
    /// forwarded.
    /// Returns whether the message was consumed.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if a reply cannot be sent.
    pub async fn on_text(
        &self,
        location: &ThreadKey,
        user_id: u64,
        text: &str,
    ) -> Result<bool, PlatformError> {
        if self.waiters.deliver(*location, user_id, text).await {
            return Ok(true);
        }
        let Some(conversation) = self.threads.route(location, user_id).await else {
            return Ok(false);
        };

        info!(thread = %location, %conversation, "forwarding thread message");
        match self
            .assistant
            .continue_conversation(&conversation, text)
            .await
        {
            Ok(reply) => self.send_long(location, &reply).await?,
            Err(e) => {
                error!(thread = %location, error = %e, "follow-up failed");
                self.platform
                    .send_text(location, copy::FORWARD_FAILED)
                    .await?;
            }
        }
        Ok(true)
    }

    /// Greet a new member; `mention` is HTML.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the greeting cannot be sent.
    pub async fn welcome(&self, location: &ThreadKey, mention: &str) -> Result<(), PlatformError> {
        let text = copy::welcome(mention, &escape_html(&self.settings.checkin_time_label));
        self.platform.send_html(location, &text).await
    }

    /// Post the daily check-in, returning its message id.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the post fails.
    pub async fn post_checkin(&self, at: &ThreadKey) -> Result<i32, PlatformError> {
        self.platform.send_checkin(at, checkin::CHECKIN_MESSAGE).await
    }

    /// The user's existing thread in this chat, or a new one.
    ///
    /// Chats without topics, and failed topic creation, use the chat itself.
    pub async fn get_or_create_thread(
        &self,
        origin: &Origin,
        who: &Member,
        name: &str,
    ) -> ThreadKey {
        if !origin.topics_enabled {
            return origin.location;
        }
        if let Some(existing) = self
            .threads
            .owned_thread(origin.location.chat_id, who.user_id)
            .await
        {
            return existing;
        }
        match self.platform.open_thread(origin, name).await {
            Ok(thread) => {
                info!(%thread, name, "thread created");
                self.threads.set_owner(who.user_id, thread).await;
                thread
            }
            Err(e) => {
                warn!(error = %e, name, "could not open thread; using the current chat");
                origin.location
            }
        }
    }

    /// Send `text`, split to fit the platform limit.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] on the first failed send.
    pub async fn send_long(&self, at: &ThreadKey, text: &str) -> Result<(), PlatformError> {
        for part in split_message(text, self.settings.limits) {
            self.platform.send_text(at, &part).await?;
        }
        Ok(())
    }

    /// Bind a fresh conversation to `thread`, or report the failure there.
    async fn start_in_thread(
        &self,
        thread: &ThreadKey,
        who: &Member,
        started: Result<(ConversationId, String), AssistantError>,
    ) -> Result<Option<String>, PlatformError> {
        match started {
            Ok((conversation, reply)) => {
                self.threads.bind(*thread, conversation, who.user_id).await;
                Ok(Some(reply))
            }
            Err(e) => {
                error!(%thread, error = %e, "assistant request failed");
                self.platform
                    .send_text(thread, copy::ASSISTANT_FAILED)
                    .await?;
                Ok(None)
            }
        }
    }

    /// Ask one intake round and wait for the user's answers.
    ///
    /// `confirm` posts the main-chat pointer once the questions are out.
    async fn intake_round(
        &self,
        thread: &ThreadKey,
        who: &Member,
        questions: &str,
        confirm: Option<(&Origin, &str)>,
    ) -> Result<Option<Vec<String>>, PlatformError> {
        let reply = self.waiters.register(*thread, who.user_id).await;
        self.platform.send_text(thread, questions).await?;
        if let Some((origin, name)) = confirm {
            self.confirm(origin, thread, name, copy::meal_plan_created)
                .await?;
        }

        let answer = match tokio::time::timeout(self.settings.intake_timeout, reply).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(_)) => {
                info!(%thread, "intake superseded by a newer request");
                return Ok(None);
            }
            Err(_) => {
                self.waiters.cancel(*thread, who.user_id).await;
                self.platform.send_text(thread, copy::INTAKE_TIMEOUT).await?;
                return Ok(None);
            }
        };

        let answers = mealplan::split_answers(&answer);
        info!(%thread, count = answers.len(), "parsed intake answers");
        if !mealplan::has_enough_answers(&answers) {
            self.platform
                .send_text(thread, mealplan::INCOMPLETE_ANSWERS)
                .await?;
            return Ok(None);
        }
        Ok(Some(answers))
    }

    /// Point the main chat at a thread that lives elsewhere.
    async fn confirm(
        &self,
        origin: &Origin,
        thread: &ThreadKey,
        name: &str,
        message: fn(&str) -> String,
    ) -> Result<(), PlatformError> {
        if *thread == origin.location {
            return Ok(());
        }
        let label = escape_html(name);
        let reference = match thread_link(thread) {
            Some(url) => format!("<a href=\"{url}\">{label}</a>"),
            None => format!("<b>{label}</b>"),
        };
        self.platform
            .send_html(&origin.location, &message(&reference))
            .await
    }
}
