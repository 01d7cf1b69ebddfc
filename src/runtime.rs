//! Runtime for executing conversation turns
//!
//! The state machine decides; the runtime does. Each inbound message becomes
//! one turn, run under the chat's session lock, with the state machine's
//! effects executed in order against the action executor and the transport.

mod executor;
pub mod traits;


pub use executor::{FlowRuntime, RuntimeError};
pub use traits::*;

use crate::action::HttpActionExecutor;
use crate::session::ChatId;
use crate::state_machine::Notice;
use crate::telegram::TelegramTransport;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = FlowRuntime<HttpActionExecutor, TelegramTransport>;

/// A text message received from a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub text: String,
}

impl InboundEvent {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

/// Wording of the fixed, non-step messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notices {
    pub no_conversation: String,
    pub invalid_option: String,
    /// Sent once when an action or template fails
    pub failure: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            no_conversation: "No conversation found for that message.".to_string(),
            invalid_option: "Please select one of the available options.".to_string(),
            failure: "Sorry, we had trouble responding to your message.".to_string(),
        }
    }
}

impl Notices {
    pub fn text(&self, notice: Notice) -> &str {
        match notice {
            Notice::NoConversation => &self.no_conversation,
            Notice::InvalidOption => &self.invalid_option,
        }
    }
}

/// Fans inbound messages out to one task per turn.
///
/// Turns for different chats run in parallel; the session lock inside the
/// runtime serializes turns for the same chat.
pub struct Dispatcher<R> {
    runtime: Arc<R>,
    shutdown: CancellationToken,
}

impl<A, T> Dispatcher<FlowRuntime<A, T>>
where
    A: ActionExecutor + 'static,
    T: Transport + 'static,
{
    pub fn new(runtime: Arc<FlowRuntime<A, T>>, shutdown: CancellationToken) -> Self {
        Self { runtime, shutdown }
    }

    /// Run until the inbound channel closes or shutdown is requested, then
    /// wait for in-flight turns to finish
    pub async fn run(self, mut inbound: mpsc::Receiver<InboundEvent>) {
        let mut turns = JoinSet::new();

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, no longer accepting messages");
                    break;
                }
                event = inbound.recv() => {
                    let Some(event) = event else {
                        tracing::info!("Inbound channel closed");
                        break;
                    };
                    let runtime = Arc::clone(&self.runtime);
                    turns.spawn(async move {
                        let chat_id = event.chat_id;
                        if let Err(e) = runtime.handle(event).await {
                            tracing::error!(chat_id, error = %e, "Turn aborted");
                        }
                    });
                }
                Some(joined) = turns.join_next(), if !turns.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Turn task panicked");
                    }
                }
            }
        }

        let in_flight = turns.len();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for in-flight turns");
        }
        while let Some(joined) = turns.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Turn task panicked");
            }
        }
        // Sessions live in memory only and end with the process
        tracing::info!(
            open_sessions = self.runtime.active_chats(),
            "Dispatcher stopped"
        );
    }
}
