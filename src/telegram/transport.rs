//! Outbound delivery through the Bot API

use super::api::{ReplyKeyboard, SendMessage, TelegramApi};
use crate::runtime::{Transport, TransportError};
use crate::session::ChatId;
use async_trait::async_trait;
use serde_json::{json, Value};

/// [`Transport`] backed by the Telegram Bot API.
///
/// Media are sent by file id or URL; Telegram fetches URLs itself.
#[derive(Clone)]
pub struct TelegramTransport {
    api: TelegramApi,
}

impl TelegramTransport {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }

    async fn send_media(
        &self,
        method: &str,
        field: &str,
        chat_id: ChatId,
        file: &str,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "chat_id": chat_id });
        body[field] = Value::String(file.to_string());
        self.api.call::<_, Value>(method, &body).await?;
        tracing::debug!(chat_id, method, "Media sent");
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &[String],
    ) -> Result<(), TransportError> {
        let body = SendMessage {
            chat_id,
            text,
            reply_markup: ReplyKeyboard::from_options(options),
        };
        self.api.call::<_, Value>("sendMessage", &body).await?;
        tracing::debug!(chat_id, options = options.len(), "Message sent");
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError> {
        self.send_media("sendPhoto", "photo", chat_id, file).await
    }

    async fn send_video(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError> {
        self.send_media("sendVideo", "video", chat_id, file).await
    }

    async fn send_document(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError> {
        self.send_media("sendDocument", "document", chat_id, file).await
    }
}
