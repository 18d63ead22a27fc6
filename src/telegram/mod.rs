//! Telegram adapter: command parsing, UI formatting, and bot dispatcher.
//!
//! The dispatcher handles updates for one chat sequentially, so every flow
//! that waits on the assistant or on user input is spawned. That keeps
//! intake answers flowing to [`Coach::on_text`] while a `/mealplan` waits.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{Chat, ChatKind, PublicChatKind};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::assistant::Assistant;
use crate::coach::checkin::{self, CheckInMark, CheckInSchedule, CheckInTally};
use crate::coach::{
    ChatPlatform, Coach, CoachSettings, Member, Origin, PlatformError, ThreadKey,
};
use crate::config::Config;
use crate::nutrition::NutritionService;

pub mod commands;
pub mod platform;
pub mod ui;

pub use platform::TelegramPlatform;

use commands::{Command, Parsed};

// ---------------------------------------------------------------------------
// Shared state for handler injection
// ---------------------------------------------------------------------------

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
struct SharedState {
    coach: Arc<Coach>,
    platform: Arc<TelegramPlatform>,
    tally: Arc<CheckInTally>,
    bot_username: Arc<str>,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Run the bot until Ctrl+C.
///
/// Logs in, registers the command menu, starts the daily check-in loop if a
/// check-in chat is configured, and dispatches updates.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or Telegram cannot
/// be reached at startup.
pub async fn run_bot(
    config: &Config,
    assistant: Arc<dyn Assistant>,
    nutrition: NutritionService,
) -> anyhow::Result<()> {
    let bot = Bot::new(config.bot_token()?);
    let me = bot
        .get_me()
        .await
        .context("failed to log in to Telegram")?;
    info!(username = %me.username(), id = me.id.0, "logged in");

    match bot.set_my_commands(commands::bot_commands()).await {
        Ok(_) => info!("command menu registered"),
        Err(e) => warn!(error = %e, "failed to register command menu"),
    }

    let platform = Arc::new(TelegramPlatform::new(bot.clone()));
    let settings = CoachSettings {
        limits: config.messages.limits()?,
        intake_timeout: config.telegram.intake_timeout(),
        checkin_time_label: config.checkin.time_label.clone(),
        ..CoachSettings::default()
    };
    let chat_platform: Arc<dyn ChatPlatform> = platform.clone();
    let coach = Arc::new(Coach::new(chat_platform, assistant, nutrition, settings));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let checkins = spawn_checkins(config, Arc::clone(&coach), shutdown_rx)?;

    let shared = SharedState {
        coach,
        platform,
        tally: Arc::new(CheckInTally::new()),
        bot_username: Arc::from(me.username()),
    };

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![shared])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // Receiver may already be gone if the loop never started.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = checkins {
        if let Err(e) = handle.await {
            warn!(error = %e, "check-in task ended abnormally");
        }
    }
    info!("telegram dispatcher stopped");
    Ok(())
}

fn spawn_checkins(
    config: &Config,
    coach: Arc<Coach>,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<Option<tokio::task::JoinHandle<()>>> {
    let checkin_config = &config.checkin;
    if !checkin_config.enabled {
        info!("daily check-in disabled");
        return Ok(None);
    }
    let Some(chat_id) = checkin_config.chat_id else {
        warn!("daily check-in enabled but no check-in chat configured (set CHECK_IN_CHAT_ID)");
        return Ok(None);
    };
    let target = ThreadKey {
        chat_id,
        thread_id: checkin_config.thread_id,
    };
    let schedule = CheckInSchedule::new(&checkin_config.cron, &checkin_config.timezone)?;
    let tick = std::time::Duration::from_secs(checkin_config.tick_secs.max(1));
    Ok(Some(tokio::spawn(checkin::run_checkins(
        coach,
        target,
        schedule,
        tick,
        shutdown_rx,
    ))))
}

// ---------------------------------------------------------------------------
// Message handler
// ---------------------------------------------------------------------------

/// Handle an incoming Telegram message.
async fn handle_message(msg: Message, state: SharedState) -> ResponseResult<()> {
    let location = thread_key(&msg);

    if let Some(members) = msg.new_chat_members() {
        for member in members.iter().filter(|m| !m.is_bot) {
            let mention = ui::user_mention(member.id.0, &member.full_name());
            if let Err(e) = state.coach.welcome(&location, &mention).await {
                warn!(error = %e, "failed to send welcome");
            }
        }
        return Ok(());
    }

    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        debug!(thread = %location, "non-text message ignored");
        return Ok(());
    };

    let origin = Origin {
        location,
        topics_enabled: topics_enabled(&msg.chat),
    };
    let who = Member {
        user_id: user.id.0,
        display_name: user.full_name(),
    };

    match commands::parse_for(text, Some(&*state.bot_username)) {
        Parsed::Command(command) => dispatch_command(command, origin, who, &state),
        Parsed::Usage(reply) | Parsed::Unknown(reply) => {
            if let Err(e) = state.platform.send_html(&location, &reply).await {
                warn!(error = %e, "failed to send command reply");
            }
        }
        Parsed::Text => {
            let coach = Arc::clone(&state.coach);
            let text = text.to_owned();
            spawn_flow("follow-up", async move {
                coach.on_text(&location, who.user_id, &text).await.map(|_| ())
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Command dispatcher
// ---------------------------------------------------------------------------

/// Start the flow for `command` in the background.
fn dispatch_command(command: Command, origin: Origin, who: Member, state: &SharedState) {
    let coach = Arc::clone(&state.coach);
    info!(?command, thread = %origin.location, user_id = who.user_id, "command received");
    match command {
        Command::Help => spawn_flow("help", async move { coach.help(&origin).await }),
        Command::RiftTaps => {
            spawn_flow("rift_taps", async move { coach.rift_taps(&origin, &who).await });
        }
        Command::Ask(question) => spawn_flow("ask", async move {
            coach.ask(&origin, &who, &question).await
        }),
        Command::MealPlan => {
            spawn_flow("mealplan", async move { coach.meal_plan(&origin, &who).await });
        }
        Command::Nutrition(food) => spawn_flow("nutrition", async move {
            coach.nutrition(&origin, &food).await
        }),
    }
}

fn spawn_flow<F>(name: &'static str, flow: F)
where
    F: Future<Output = Result<(), PlatformError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = flow.await {
            warn!(flow = name, error = %e, "chat flow failed");
        }
    });
}

// ---------------------------------------------------------------------------
// Callback query handler
// ---------------------------------------------------------------------------

/// Handle check-in button taps.
async fn handle_callback(bot: Bot, query: CallbackQuery, state: SharedState) -> ResponseResult<()> {
    let mark = query.data.as_deref().and_then(CheckInMark::from_callback);
    let (Some(mark), Some(message)) = (mark, query.regular_message()) else {
        bot.answer_callback_query(&query.id)
            .text("Unknown action")
            .await?;
        return Ok(());
    };

    let set = state.tally.toggle(message.id.0, query.from.id.0, mark).await;
    let answer = if set {
        format!("{} {} logged", mark.emoji(), mark.label())
    } else {
        format!("{} {} removed", mark.emoji(), mark.label())
    };
    bot.answer_callback_query(&query.id).text(answer).await?;

    let counts = state.tally.counts(message.id.0).await;
    if let Err(e) = bot
        .edit_message_reply_markup(message.chat.id, message.id)
        .reply_markup(ui::checkin_keyboard(&counts))
        .await
    {
        debug!(error = %e, "failed to refresh check-in buttons");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Thread a message belongs to: its forum topic, or the chat.
fn thread_key(msg: &Message) -> ThreadKey {
    match msg.thread_id.as_ref() {
        Some(thread) if msg.is_topic_message => ThreadKey::topic(msg.chat.id.0, thread.0 .0),
        _ => ThreadKey::chat(msg.chat.id.0),
    }
}

fn topics_enabled(chat: &Chat) -> bool {
    match &chat.kind {
        ChatKind::Public(public) => {
            matches!(&public.kind, PublicChatKind::Supergroup(group) if group.is_forum)
        }
        ChatKind::Private(_) => false,
    }
}
