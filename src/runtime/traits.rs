//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::action::{ActionError, ActionResult};
use crate::flow::ActionSpec;
use crate::session::ChatId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Executor for step actions
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Perform the request once; no retries
    async fn execute(&self, spec: &ActionSpec) -> Result<ActionResult, ActionError>;
}

/// Outbound side of the chat transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a step message, offering `options` as reply choices when non-empty
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &[String],
    ) -> Result<(), TransportError>;

    async fn send_photo(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError>;

    async fn send_video(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError>;

    async fn send_document(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError>;

    /// Send a fixed notice; defaults to a plain text message
    async fn send_notice(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &[String],
    ) -> Result<(), TransportError> {
        self.send_text(chat_id, text, options).await
    }
}

/// Error delivering something to a chat
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    /// The remote API answered but refused the request
    #[error("Rejected by API{}: {description}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Rejected {
        status: Option<u16>,
        description: String,
    },
    #[error("Invalid API response: {0}")]
    Decode(String),
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ActionExecutor + ?Sized> ActionExecutor for Arc<T> {
    async fn execute(&self, spec: &ActionSpec) -> Result<ActionResult, ActionError> {
        (**self).execute(spec).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &[String],
    ) -> Result<(), TransportError> {
        (**self).send_text(chat_id, text, options).await
    }

    async fn send_photo(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError> {
        (**self).send_photo(chat_id, file).await
    }

    async fn send_video(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError> {
        (**self).send_video(chat_id, file).await
    }

    async fn send_document(&self, chat_id: ChatId, file: &str) -> Result<(), TransportError> {
        (**self).send_document(chat_id, file).await
    }

    async fn send_notice(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &[String],
    ) -> Result<(), TransportError> {
        (**self).send_notice(chat_id, text, options).await
    }
}
