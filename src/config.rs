//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default interval between outbound reconciliation ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Runtime configuration for the sync bridge.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bot token used for Web API calls (`xoxb-...`).
    pub bot_token: SecretString,
    /// App-level token used to open Socket Mode connections (`xapp-...`).
    pub app_token: SecretString,
    /// Whether inbound events are written into the document.
    pub enabled: bool,
    /// Path of the synchronization document.
    pub document_path: PathBuf,
    /// Path of the channel registry JSON file.
    pub channels_path: PathBuf,
    /// Interval between outbound reconciliation ticks.
    pub poll_interval: Duration,
    /// Web API base URL.
    pub api_base: String,
}

impl SyncConfig {
    /// Build config from environment variables.
    ///
    /// Both tokens are required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = required_secret(
            "SLACK_BOT_TOKEN",
            "Create a Slack app and export its bot token (xoxb-...).",
        )?;
        let app_token = required_secret(
            "SLACK_APP_TOKEN",
            "Enable Socket Mode and export an app-level token (xapp-...).",
        )?;

        let enabled = std::env::var("BOT_ENABLED").is_ok_and(|v| v == "true");

        let document_path = std::env::var("RAVEL_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ravel.md"));

        let channels_path = std::env::var("RAVEL_CHANNELS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("channels.json"));

        let poll_interval = parse_poll_interval(std::env::var("RAVEL_POLL_INTERVAL_MS").ok());

        let api_base =
            std::env::var("SLACK_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        Ok(Self {
            bot_token,
            app_token,
            enabled,
            document_path,
            channels_path,
            poll_interval,
            api_base,
        })
    }
}

fn required_secret(key: &str, hint: &str) -> Result<SecretString, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(ConfigError::MissingRequired {
            key: key.to_string(),
            hint: hint.to_string(),
        }),
    }
}

/// Zero or unparseable values fall back to the default interval.
fn parse_poll_interval(raw: Option<String>) -> Duration {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}
