//! Config file loading and precedence.

use std::io::Write;

use repbyrep::config::{Config, ConfigError, CONFIG_PATH_ENV};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn file_values_load_and_env_wins() {
    let file = write_config(
        r#"
[telegram]
bot_token = "file-token"

[assistant]
api_key = "sk-file"
assistant_id = "asst_file"

[checkin]
chat_id = -100777
"#,
    );
    let path = file.path().display().to_string();

    let config = Config::load_with(|key| match key {
        CONFIG_PATH_ENV => Some(path.clone()),
        "ASSISTANT_ID" => Some("asst_env".to_owned()),
        _ => None,
    })
    .expect("load");

    assert_eq!(config.telegram.bot_token.as_deref(), Some("file-token"));
    assert_eq!(config.assistant.assistant_id.as_deref(), Some("asst_env"));
    assert_eq!(config.checkin.chat_id, Some(-100_777));
    assert!(config.validate().is_ok());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.toml").display().to_string();

    let config = Config::load_with(|key| (key == CONFIG_PATH_ENV).then(|| path.clone()))
        .expect("defaults");

    assert!(config.telegram.bot_token.is_none());
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Missing {
            env: "TELEGRAM_BOT_TOKEN",
            ..
        })
    ));
}

#[test]
fn malformed_file_is_an_error() {
    let file = write_config("[telegram\nbot_token = 1");
    let path = file.path().display().to_string();
    assert!(Config::load_with(|key| (key == CONFIG_PATH_ENV).then(|| path.clone())).is_err());
}

#[test]
fn inconsistent_message_limits_fail_validation() {
    let mut config = Config::from_toml(
        r#"
[telegram]
bot_token = "t"

[assistant]
api_key = "k"
assistant_id = "a"

[messages]
max_len = 100
soft_len = 100
"#,
    )
    .expect("parse");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            field: "messages.soft_len",
            ..
        })
    ));

    config.messages.soft_len = 80;
    assert!(config.validate().is_ok());
}

#[test]
fn disabled_checkin_skips_schedule_checks() {
    let config = Config::from_toml(
        r#"
[telegram]
bot_token = "t"

[assistant]
api_key = "k"
assistant_id = "a"

[checkin]
enabled = false
cron = "whenever"
"#,
    )
    .expect("parse");
    assert!(config.validate().is_ok());
}

#[test]
fn zero_assistant_timings_fail_validation() {
    let base = r#"
[telegram]
bot_token = "t"

[assistant]
api_key = "k"
assistant_id = "a"
"#;

    let mut config = Config::from_toml(base).expect("parse");
    config.assistant.poll_interval_ms = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            field: "assistant.poll_interval_ms",
            ..
        })
    ));

    let mut config = Config::from_toml(base).expect("parse");
    config.assistant.run_timeout_secs = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            field: "assistant.run_timeout_secs",
            ..
        })
    ));
}
