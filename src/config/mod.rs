//! Configuration loading and validation.
//!
//! Loads bot configuration from `./config.toml` (or `$REPBYREP_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::assistant::openai::AssistantSettings;
use crate::messaging::SplitLimits;

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "REPBYREP_CONFIG_PATH";

// ── Errors ──────────────────────────────────────────────────────

/// Configuration problems detected by [`Config::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required value is absent from both file and environment.
    #[error("missing required setting `{key}` (set {env} or [{section}].{key})")]
    Missing {
        /// TOML section.
        section: &'static str,
        /// TOML key.
        key: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A value is present but unusable.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

// ── Top-level config ────────────────────────────────────────────

/// Top-level bot configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Telegram connection and conversation settings.
    pub telegram: TelegramConfig,
    /// LLM assistant backend.
    pub assistant: AssistantConfig,
    /// External nutrition databases.
    pub nutrition: NutritionConfig,
    /// Daily check-in post.
    pub checkin: CheckInConfig,
    /// Outbound message limits.
    pub messages: MessagesConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// If the file does not exist, defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration resolving environment variables through `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = Self::config_path_with(&env);
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(env);
        Ok(config)
    }

    fn load_from_file(path: &PathBuf) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config file path: `$REPBYREP_CONFIG_PATH` or `./config.toml`.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrongly typed fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }

        if let Some(v) = env("OPENAI_API_KEY") {
            self.assistant.api_key = Some(v);
        }
        if let Some(v) = env("ASSISTANT_ID") {
            self.assistant.assistant_id = Some(v);
        }
        if let Some(v) = env("OPENAI_BASE_URL") {
            self.assistant.base_url = v;
        }

        if let Some(v) = env("USDA_API_KEY") {
            self.nutrition.usda_api_key = Some(v);
        }

        if let Some(v) = env("CHECK_IN_CHAT_ID") {
            match v.parse() {
                Ok(id) => self.checkin.chat_id = Some(id),
                Err(_) => tracing::warn!(
                    var = "CHECK_IN_CHAT_ID",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("CHECK_IN_THREAD_ID") {
            match v.parse() {
                Ok(id) => self.checkin.thread_id = Some(id),
                Err(_) => tracing::warn!(
                    var = "CHECK_IN_THREAD_ID",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        if let Some(v) = env("REPBYREP_LOG_DIR") {
            self.logging.dir = Some(v);
        }
    }

    /// Check everything `start` needs: credentials, limits, schedule.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bot_token()?;
        self.assistant.settings()?;
        self.messages.limits()?;
        if self.checkin.enabled {
            crate::coach::checkin::CheckInSchedule::new(&self.checkin.cron, &self.checkin.timezone)?;
        }
        Ok(())
    }

    /// The Telegram bot token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if no token is configured.
    pub fn bot_token(&self) -> Result<&str, ConfigError> {
        self.telegram
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing {
                section: "telegram",
                key: "bot_token",
                env: "TELEGRAM_BOT_TOKEN",
            })
    }
}

// ── Telegram ────────────────────────────────────────────────────

/// Telegram settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from BotFather.
    pub bot_token: Option<String>,
    /// How long the meal plan intake waits for each answer, in seconds.
    pub intake_timeout_secs: u64,
}

impl TelegramConfig {
    /// Intake timeout as a [`Duration`].
    pub fn intake_timeout(&self) -> Duration {
        Duration::from_secs(self.intake_timeout_secs)
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "__REDACTED__"))
            .field("intake_timeout_secs", &self.intake_timeout_secs)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            intake_timeout_secs: 300,
        }
    }
}

// ── Assistant ───────────────────────────────────────────────────

/// OpenAI Assistants API settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// API base URL including the version segment.
    pub base_url: String,
    /// API key.
    pub api_key: Option<String>,
    /// Assistant identifier (`asst_...`).
    pub assistant_id: Option<String>,
    /// Maximum time a run may take before giving up, in seconds.
    pub run_timeout_secs: u64,
    /// Delay between run status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Attempts at creating a conversation before failing.
    pub create_attempts: u32,
    /// Delay between conversation creation attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl AssistantConfig {
    /// Build client settings, checking credentials and the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the key or assistant id is missing, the URL is
    /// malformed, or `create_attempts`, `run_timeout_secs` or
    /// `poll_interval_ms` is zero.
    pub fn settings(&self) -> Result<AssistantSettings, ConfigError> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing {
                section: "assistant",
                key: "api_key",
                env: "OPENAI_API_KEY",
            })?;
        let assistant_id = self
            .assistant_id
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing {
                section: "assistant",
                key: "assistant_id",
                env: "ASSISTANT_ID",
            })?;
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::Invalid {
            field: "assistant.base_url",
            reason: e.to_string(),
        })?;
        for (field, value) in [
            ("assistant.create_attempts", u64::from(self.create_attempts)),
            ("assistant.run_timeout_secs", self.run_timeout_secs),
            ("assistant.poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_owned(),
                });
            }
        }

        Ok(AssistantSettings {
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            api_key,
            assistant_id,
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            create_attempts: self.create_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        })
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .field("assistant_id", &self.assistant_id)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("create_attempts", &self.create_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_owned(),
            api_key: None,
            assistant_id: None,
            run_timeout_secs: 30,
            poll_interval_ms: 500,
            create_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

// ── Nutrition ───────────────────────────────────────────────────

/// Nutrition database endpoints.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct NutritionConfig {
    /// FoodData Central API key. Without it only the fallback table is used.
    pub usda_api_key: Option<String>,
    /// FoodData Central base URL.
    pub usda_base_url: String,
    /// Open Food Facts base URL.
    pub open_food_facts_base_url: String,
}

impl std::fmt::Debug for NutritionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NutritionConfig")
            .field(
                "usda_api_key",
                &self.usda_api_key.as_ref().map(|_| "__REDACTED__"),
            )
            .field("usda_base_url", &self.usda_base_url)
            .field("open_food_facts_base_url", &self.open_food_facts_base_url)
            .finish()
    }
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            usda_api_key: None,
            usda_base_url: "https://api.nal.usda.gov/fdc/v1".to_owned(),
            open_food_facts_base_url: "https://world.openfoodfacts.org".to_owned(),
        }
    }
}

// ── Check-in ────────────────────────────────────────────────────

/// Daily check-in post settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckInConfig {
    /// Whether the check-in loop runs at all.
    pub enabled: bool,
    /// Chat receiving the check-in.
    pub chat_id: Option<i64>,
    /// Forum topic inside that chat, if any.
    pub thread_id: Option<i32>,
    /// Six-field cron expression (sec min hour day month weekday).
    pub cron: String,
    /// IANA timezone the cron expression is evaluated in.
    pub timezone: String,
    /// Human label for the check-in time used in greetings.
    pub time_label: String,
    /// How often the schedule is evaluated, in seconds.
    pub tick_secs: u64,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chat_id: None,
            thread_id: None,
            cron: "0 0 20 * * *".to_owned(),
            timezone: "America/New_York".to_owned(),
            time_label: "8 PM EST".to_owned(),
            tick_secs: 30,
        }
    }
}

// ── Messages ────────────────────────────────────────────────────

/// Outbound message size limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Platform hard limit in characters.
    pub max_len: usize,
    /// Target size when packing paragraphs.
    pub soft_len: usize,
}

impl MessagesConfig {
    /// Convert to splitter limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the limits are inconsistent.
    pub fn limits(&self) -> Result<SplitLimits, ConfigError> {
        SplitLimits::new(self.max_len, self.soft_len).ok_or_else(|| ConfigError::Invalid {
            field: "messages.soft_len",
            reason: format!(
                "must leave room for the continuation marker below max_len ({} / {})",
                self.soft_len, self.max_len
            ),
        })
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            max_len: 4096,
            soft_len: 3900,
        }
    }
}

// ── Logging ─────────────────────────────────────────────────────

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rotated JSON logs. Defaults to `~/.repbyrep/logs`.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    /// Resolve the log directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home directory
    /// cannot be determined.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.dir {
            return Ok(PathBuf::from(dir));
        }
        Ok(data_dir()?.join("logs"))
    }
}

/// Resolve the default data directory (`~/.repbyrep/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn data_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".repbyrep"))
}

// ── Tests ───────────────────────────────────────────────────────
