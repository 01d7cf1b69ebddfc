//! Process configuration from environment variables

use crate::runtime::Notices;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONVERSATION_FILE: &str = "config/conversation.json";
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },
}

/// Everything the bot needs to start
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub conversation_file: PathBuf,
    /// Applied to every external action
    pub action_timeout: Duration,
    pub api_base: String,
    pub poll_timeout: Duration,
    /// Bound on each outbound Bot API call
    pub send_timeout: Duration,
    pub notices: Notices,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EnvError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bot_token = get("BOT_TOKEN").ok_or(EnvError::Missing("BOT_TOKEN"))?;

        let seconds = |name: &'static str, default: u64| -> Result<Duration, EnvError> {
            match get(name) {
                None => Ok(Duration::from_secs(default)),
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Duration::from_secs)
                    .map_err(|_| EnvError::InvalidSeconds { name, value }),
            }
        };

        Ok(Self {
            bot_token,
            conversation_file: get("CHATFLOW_CONFIG")
                .map_or_else(|| PathBuf::from(DEFAULT_CONVERSATION_FILE), PathBuf::from),
            action_timeout: seconds("ACTION_TIMEOUT_SECS", DEFAULT_ACTION_TIMEOUT_SECS)?,
            api_base: get("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            poll_timeout: seconds("TELEGRAM_POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?,
            send_timeout: seconds("TELEGRAM_SEND_TIMEOUT_SECS", DEFAULT_SEND_TIMEOUT_SECS)?,
            notices: notices(&get),
        })
    }
}

/// Notice wording, each message overridable on its own
fn notices(get: impl Fn(&str) -> Option<String>) -> Notices {
    let defaults = Notices::default();
    Notices {
        no_conversation: get("NOTICE_NO_CONVERSATION").unwrap_or(defaults.no_conversation),
        invalid_option: get("NOTICE_INVALID_OPTION").unwrap_or(defaults.invalid_option),
        failure: get("NOTICE_FAILURE").unwrap_or(defaults.failure),
    }
}
