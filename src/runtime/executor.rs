//! Conversation turn executor

use super::traits::{ActionExecutor, Transport, TransportError};
use super::{InboundEvent, Notices};

use crate::flow::ConversationRegistry;
use crate::session::{SessionGuard, SessionStore};
use crate::state_machine::{transition, ChatState, Effect, Event, TransitionError};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// Errors that abort a turn part way
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to deliver to chat: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Generic turn runtime that can work with any action executor and transport
pub struct FlowRuntime<A, T>
where
    A: ActionExecutor,
    T: Transport,
{
    registry: Arc<ConversationRegistry>,
    sessions: Arc<SessionStore>,
    actions: A,
    transport: T,
    notices: Notices,
}

impl<A, T> FlowRuntime<A, T>
where
    A: ActionExecutor,
    T: Transport,
{
    pub fn new(
        registry: Arc<ConversationRegistry>,
        sessions: Arc<SessionStore>,
        actions: A,
        transport: T,
    ) -> Self {
        Self {
            registry,
            sessions,
            actions,
            transport,
            notices: Notices::default(),
        }
    }

    pub fn with_notices(mut self, notices: Notices) -> Self {
        self.notices = notices;
        self
    }

    /// Chats with an open session or a turn in progress
    pub fn active_chats(&self) -> usize {
        self.sessions.active_chats()
    }

    /// Run one turn for an inbound message.
    ///
    /// The chat's session stays locked until every effect of the turn has
    /// been executed, including any action the turn triggers.
    pub async fn handle(&self, inbound: InboundEvent) -> Result<(), RuntimeError> {
        let turn_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("turn", %turn_id, chat_id = inbound.chat_id);
        self.run_turn(inbound).instrument(span).await
    }

    async fn run_turn(&self, inbound: InboundEvent) -> Result<(), RuntimeError> {
        let InboundEvent { chat_id, text } = inbound;
        let mut session = self.sessions.lock(chat_id).await;
        let mut state = ChatState::from_session(session.get());

        tracing::debug!(state = state.name(), "Turn started");

        // Process events in a loop to handle chained effects
        let mut pending = VecDeque::from([Event::inbound(text)]);

        while let Some(event) = pending.pop_front() {
            let result = match transition(&state, &self.registry, event) {
                Ok(r) => r,
                Err(TransitionError::SessionDrift {
                    conversation_id,
                    step_id,
                }) => {
                    // Stale session: forget it so the next message starts fresh
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        step_id = %step_id,
                        "Session points at a step that no longer exists, clearing it"
                    );
                    session.delete();
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            state = result.new_state;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(&mut session, effect).await? {
                    pending.push_back(generated);
                }
            }
        }

        tracing::debug!(state = state.name(), "Turn finished");
        Ok(())
    }

    async fn execute_effect(
        &self,
        session: &mut SessionGuard<'_>,
        effect: Effect,
    ) -> Result<Option<Event>, RuntimeError> {
        let chat_id = session.chat_id();

        match effect {
            Effect::RunAction {
                conversation_id,
                step_id,
                spec,
            } => {
                tracing::debug!(
                    conversation_id = %conversation_id,
                    step_id = %step_id,
                    method = spec.method.as_str(),
                    url = %spec.url,
                    "Running step action"
                );
                let event = match self.actions.execute(&spec).await {
                    Ok(result) => Event::ActionSucceeded {
                        conversation_id,
                        step_id,
                        result,
                    },
                    Err(error) => Event::ActionFailed {
                        conversation_id,
                        step_id,
                        error,
                    },
                };
                Ok(Some(event))
            }

            Effect::PersistSession {
                conversation_id,
                step_id,
            } => {
                session.set(&conversation_id, &step_id);
                tracing::info!(
                    conversation_id = %conversation_id,
                    step_id = %step_id,
                    "Entered step"
                );
                Ok(None)
            }

            Effect::ClearSession => {
                if let Some(ended) = session.delete() {
                    let elapsed = ended.updated_at - ended.started_at;
                    tracing::info!(
                        conversation_id = %ended.conversation_id,
                        step_id = %ended.current_step_id,
                        duration_ms = elapsed.num_milliseconds(),
                        "Conversation ended"
                    );
                }
                Ok(None)
            }

            Effect::SendPhoto { file } => {
                self.transport.send_photo(chat_id, &file).await?;
                Ok(None)
            }

            Effect::SendVideo { file } => {
                self.transport.send_video(chat_id, &file).await?;
                Ok(None)
            }

            Effect::SendDocument { file } => {
                self.transport.send_document(chat_id, &file).await?;
                Ok(None)
            }

            Effect::SendMessage { text, options } => {
                self.transport.send_text(chat_id, &text, &options).await?;
                Ok(None)
            }

            Effect::SendNotice { notice, options } => {
                tracing::debug!(?notice, "Sending notice");
                self.transport
                    .send_notice(chat_id, self.notices.text(notice), &options)
                    .await?;
                Ok(None)
            }

            Effect::TurnFailed { reason } => {
                tracing::error!(reason = %reason, "Turn failed");
                self.transport
                    .send_notice(chat_id, &self.notices.failure, &[])
                    .await?;
                Ok(None)
            }
        }
    }
}
