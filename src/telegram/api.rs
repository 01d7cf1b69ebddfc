//! Minimal Bot API client and wire types

use crate::runtime::TransportError;
use crate::session::ChatId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Extra time on top of the long-poll timeout before the HTTP call gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Bound on every non-polling call unless overridden
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Wire types
// ============================================================================

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    /// Absent for stickers, photos and other non-text messages
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Serialize)]
pub(super) struct SendMessage<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboard>,
}

/// Persistent reply keyboard, one option per row
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct ReplyKeyboard {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct KeyboardButton {
    pub text: String,
}

impl ReplyKeyboard {
    /// `None` when there is nothing to choose from
    pub fn from_options(options: &[String]) -> Option<Self> {
        if options.is_empty() {
            return None;
        }
        Some(Self {
            keyboard: options
                .iter()
                .map(|text| vec![KeyboardButton { text: text.clone() }])
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: false,
        })
    }
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

// ============================================================================
// Client
// ============================================================================

/// Bot API client bound to one bot token
#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
    send_timeout: Duration,
}

impl TelegramApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Call a Bot API method with a JSON body, bounded by the send timeout
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call_with_timeout(method, params, self.send_timeout).await
    }

    async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        params: &P,
        timeout: Duration,
    ) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .client
            .post(self.method_url(method))
            .json(params)
            .timeout(timeout);

        // Never log the URL: it carries the bot token
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("{method}: {}", e.without_url())))?;
        let status = response.status();

        let body: ApiResponse<R> = response.json().await.map_err(|e| {
            if status.is_success() {
                TransportError::Decode(format!("{method}: {}", e.without_url()))
            } else {
                TransportError::Rejected {
                    status: Some(status.as_u16()),
                    description: status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string(),
                }
            }
        })?;

        if !body.ok {
            return Err(TransportError::Rejected {
                status: body.error_code.or(Some(status.as_u16())),
                description: body.description.unwrap_or_default(),
            });
        }

        body.result
            .ok_or_else(|| TransportError::Decode(format!("{method}: missing result")))
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let params = GetUpdates {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: ["message"],
        };
        self.call_with_timeout("getUpdates", &params, poll_timeout + POLL_GRACE)
            .await
    }
}
