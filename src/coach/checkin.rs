//! Daily check-in post.
//!
//! A cron schedule evaluated in a fixed IANA timezone decides when to post.
//! Members answer by tapping inline buttons; taps are tallied per message
//! and user in memory.

use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::{watch, Mutex};
use tracing::{error, info};

use super::{Coach, ThreadKey};
use crate::config::ConfigError;

/// Check-in post body (HTML).
pub const CHECKIN_MESSAGE: &str = "Time for your daily check-in! 💪\n\
<b>RIFT &amp; TAPS Progress</b>\n\
Tap: 💧 Hydration, 🍎 Timing, 🏋️ Workout\n\
Answer below...";

/// Callback data prefix for check-in buttons.
const CALLBACK_PREFIX: &str = "ci:";

/// One check-in item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckInMark {
    /// Drank enough between iftar and suhoor.
    Hydration,
    /// Ate at the planned times.
    Timing,
    /// Trained today.
    Workout,
}

impl CheckInMark {
    /// All marks in button order.
    pub const ALL: [Self; 3] = [Self::Hydration, Self::Timing, Self::Workout];

    /// Emoji shown on the button.
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Hydration => "💧",
            Self::Timing => "🍎",
            Self::Workout => "🏋️",
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Hydration => "Hydration",
            Self::Timing => "Timing",
            Self::Workout => "Workout",
        }
    }

    /// Inline button callback payload.
    pub fn callback_data(self) -> String {
        let code = match self {
            Self::Hydration => "h",
            Self::Timing => "t",
            Self::Workout => "w",
        };
        format!("{CALLBACK_PREFIX}{code}")
    }

    /// Parse a callback payload produced by [`Self::callback_data`].
    pub fn from_callback(data: &str) -> Option<Self> {
        match data.strip_prefix(CALLBACK_PREFIX)? {
            "h" => Some(Self::Hydration),
            "t" => Some(Self::Timing),
            "w" => Some(Self::Workout),
            _ => None,
        }
    }
}

/// When check-ins are posted.
#[derive(Debug, Clone)]
pub struct CheckInSchedule {
    schedule: cron::Schedule,
    timezone: Tz,
}

impl CheckInSchedule {
    /// Parse a six-field cron expression evaluated in `timezone`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a bad expression or an unknown
    /// timezone name.
    pub fn new(cron_expr: &str, timezone: &str) -> Result<Self, ConfigError> {
        let schedule = cron::Schedule::from_str(cron_expr).map_err(|e| ConfigError::Invalid {
            field: "checkin.cron",
            reason: e.to_string(),
        })?;
        let timezone = timezone.parse::<Tz>().map_err(|e| ConfigError::Invalid {
            field: "checkin.timezone",
            reason: e.to_string(),
        })?;
        Ok(Self { schedule, timezone })
    }

    /// Whether a fire time falls in `(last, now]`.
    pub fn is_due(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.next_after(last).is_some_and(|next| next <= now)
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&self.timezone))
            .next()
            .map(|next| next.with_timezone(&Utc))
    }
}

/// Check-in posts whose taps are remembered; older posts start over.
pub const TRACKED_POSTS: usize = 7;

/// Per-message, per-user check-in taps for the most recent posts.
#[derive(Debug, Default)]
pub struct CheckInTally {
    inner: Mutex<TallyInner>,
}

#[derive(Debug, Default)]
struct TallyInner {
    marks: HashMap<i32, HashMap<u64, HashSet<CheckInMark>>>,
    order: VecDeque<i32>,
}

impl CheckInTally {
    /// Empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `mark` for `user` on check-in `message`. Returns whether the
    /// mark is now set.
    pub async fn toggle(&self, message: i32, user: u64, mark: CheckInMark) -> bool {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if !inner.marks.contains_key(&message) {
            inner.order.push_back(message);
            while inner.order.len() > TRACKED_POSTS {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.marks.remove(&oldest);
                }
            }
        }
        let set = inner
            .marks
            .entry(message)
            .or_default()
            .entry(user)
            .or_default();
        if set.remove(&mark) {
            false
        } else {
            set.insert(mark);
            true
        }
    }

    /// How many users hold each mark on `message`, in button order.
    pub async fn counts(&self, message: i32) -> [(CheckInMark, usize); 3] {
        let inner = self.inner.lock().await;
        let users = inner.marks.get(&message);
        CheckInMark::ALL.map(|mark| {
            let count = users.map_or(0, |users| {
                users.values().filter(|set| set.contains(&mark)).count()
            });
            (mark, count)
        })
    }
}

/// Post check-ins to `target` on `schedule` until shutdown.
///
/// The first fire time considered is the one after startup; missed posts
/// while the process was down are not replayed.
pub async fn run_checkins(
    coach: Arc<Coach>,
    target: ThreadKey,
    schedule: CheckInSchedule,
    tick: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(%target, tick_secs = tick.as_secs(), "check-in loop started");
    let mut interval = tokio::time::interval(tick);
    let mut last_run = Utc::now();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Utc::now();
                if !schedule.is_due(last_run, now) {
                    continue;
                }
                last_run = now;
                match coach.post_checkin(&target).await {
                    Ok(message_id) => info!(%target, message_id, "daily check-in posted"),
                    Err(e) => error!(%target, error = %e, "failed to post daily check-in"),
                }
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    info!("check-in loop shutting down");
                    break;
                }
            }
        }
    }
}
