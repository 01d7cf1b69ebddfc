//! Pure state transition function
//!
//! Given a chat's state, the conversation registry and an event, decide the
//! new state and the effects to run. No I/O happens here: actions are
//! requested as effects and their outcomes come back as events.

use super::{ChatState, Effect, Event, Notice};
use crate::flow::{find_step, ConversationDefinition, ConversationRegistry, Step, START_STEP_ID};
use crate::template;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The session names a conversation or step the registry does not have
    #[error("Session points at unknown step {step_id} of conversation {conversation_id}")]
    SessionDrift {
        conversation_id: String,
        step_id: String,
    },
    /// An action outcome arrived for a step the registry does not have
    #[error("Action outcome for unknown step {step_id} of conversation {conversation_id}")]
    UnknownActionStep {
        conversation_id: String,
        step_id: String,
    },
}

/// Pure transition function
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: &ChatState,
    registry: &ConversationRegistry,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Idle: match triggers
        // ============================================================
        (ChatState::Idle, Event::Inbound { text }) => match registry.find_by_trigger(&text) {
            Some(conversation) => Ok(start_conversation(state, conversation)),
            None => Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::notice(Notice::NoConversation, vec![]))),
        },

        // ============================================================
        // In a step: options, default continuation, restart
        // ============================================================
        (
            ChatState::InStep {
                conversation_id,
                step_id,
            },
            Event::Inbound { text },
        ) => {
            let drift = || TransitionError::SessionDrift {
                conversation_id: conversation_id.clone(),
                step_id: step_id.clone(),
            };
            let conversation = registry.find_by_id(conversation_id).ok_or_else(drift)?;
            let current = find_step(step_id, conversation).ok_or_else(drift)?;

            let next_step_id = current
                .options
                .iter()
                .find(|option| option.text == text)
                .map(|option| option.next_step_id.as_str())
                .or(current.default_next_step.as_deref());

            let Some(next_step_id) = next_step_id else {
                // A trigger typed mid-conversation starts that conversation over
                if let Some(restart) = registry.find_by_trigger(&text) {
                    return Ok(start_conversation(state, restart));
                }
                return Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::notice(Notice::InvalidOption, current.option_labels())));
            };

            match find_step(next_step_id, conversation) {
                Some(next) => Ok(enter_step(state, conversation, next)),
                None => Ok(TransitionResult::new(state.clone()).with_effect(Effect::TurnFailed {
                    reason: format!(
                        "Step {step_id} of conversation {conversation_id} points at unknown step {next_step_id}"
                    ),
                })),
            }
        }

        // ============================================================
        // Action outcomes
        // ============================================================
        (
            _,
            Event::ActionSucceeded {
                conversation_id,
                step_id,
                result,
            },
        ) => {
            let (conversation, step) = action_step(registry, conversation_id, step_id)?;
            match template::resolve(&result.to_source(), step) {
                Ok(mut materialized) => {
                    // Ids are placeholder-free by validation; keep them pinned anyway
                    materialized.id.clone_from(&step.id);
                    Ok(complete_entry(conversation, &materialized))
                }
                Err(e) => Ok(TransitionResult::new(state.clone()).with_effect(
                    Effect::TurnFailed {
                        reason: format!("Template for step {} failed: {e}", step.id),
                    },
                )),
            }
        }

        (
            _,
            Event::ActionFailed {
                conversation_id,
                step_id,
                error,
            },
        ) => {
            let (_, step) = action_step(registry, conversation_id, step_id)?;
            Ok(
                TransitionResult::new(state.clone()).with_effect(Effect::TurnFailed {
                    reason: format!("Action for step {} failed: {error}", step.id),
                }),
            )
        }
    }
}

fn action_step(
    registry: &ConversationRegistry,
    conversation_id: String,
    step_id: String,
) -> Result<(&ConversationDefinition, &Step), TransitionError> {
    registry
        .find_by_id(&conversation_id)
        .and_then(|conversation| {
            find_step(&step_id, conversation).map(|step| (conversation, step))
        })
        .ok_or(TransitionError::UnknownActionStep {
            conversation_id,
            step_id,
        })
}

fn start_conversation(state: &ChatState, conversation: &ConversationDefinition) -> TransitionResult {
    match find_step(START_STEP_ID, conversation) {
        Some(start) => enter_step(state, conversation, start),
        None => TransitionResult::new(state.clone()).with_effect(Effect::TurnFailed {
            reason: format!("Conversation {} has no start step", conversation.id),
        }),
    }
}

/// Step entry: run the action first if there is one, otherwise complete now.
///
/// While the action runs the state stays where it was, so a failed action
/// leaves the session at the previous step.
fn enter_step(state: &ChatState, conversation: &ConversationDefinition, step: &Step) -> TransitionResult {
    match &step.action {
        Some(spec) => TransitionResult::new(state.clone()).with_effect(Effect::RunAction {
            conversation_id: conversation.id.clone(),
            step_id: step.id.clone(),
            spec: spec.clone(),
        }),
        None => complete_entry(conversation, step),
    }
}

/// Session update, media, then message.
///
/// A final step clears the session before emitting, so a failed send can
/// never leave the chat parked on a step with no way forward.
fn complete_entry(conversation: &ConversationDefinition, step: &Step) -> TransitionResult {
    let new_state = if step.end_journey {
        ChatState::Idle
    } else {
        ChatState::in_step(&conversation.id, &step.id)
    };

    let mut result = TransitionResult::new(new_state).with_effect(Effect::PersistSession {
        conversation_id: conversation.id.clone(),
        step_id: step.id.clone(),
    });
    if step.end_journey {
        result = result.with_effect(Effect::ClearSession);
    }

    result
        .with_effects(Effect::media(step.header.as_ref()))
        .with_effect(Effect::message(step))
}
