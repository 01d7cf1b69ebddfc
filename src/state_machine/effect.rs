//! Effects produced by state transitions

use crate::flow::{ActionSpec, MediaHeader, Step};

/// Fixed user-facing notices; wording lives in the runtime's `Notices`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Idle chat sent text matching no trigger
    NoConversation,
    /// Input matched no option and the step has no default
    InvalidOption,
}

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run a step's action; the outcome comes back as an event
    RunAction {
        conversation_id: String,
        step_id: String,
        spec: ActionSpec,
    },

    /// Point the chat's session at a step
    PersistSession {
        conversation_id: String,
        step_id: String,
    },

    /// Remove the chat's session
    ClearSession,

    SendPhoto { file: String },
    SendVideo { file: String },
    SendDocument { file: String },

    /// A step's message with its options as reply choices
    SendMessage { text: String, options: Vec<String> },

    SendNotice { notice: Notice, options: Vec<String> },

    /// The turn failed; the user gets one generic failure notice
    TurnFailed { reason: String },
}

impl Effect {
    /// Media attachments in delivery order: photo, video, document
    pub fn media(header: Option<&MediaHeader>) -> Vec<Effect> {
        let Some(header) = header else {
            return vec![];
        };
        let mut effects = Vec::new();
        if let Some(file) = &header.photo {
            effects.push(Effect::SendPhoto { file: file.clone() });
        }
        if let Some(file) = &header.video {
            effects.push(Effect::SendVideo { file: file.clone() });
        }
        if let Some(file) = &header.document {
            effects.push(Effect::SendDocument { file: file.clone() });
        }
        effects
    }

    pub fn message(step: &Step) -> Self {
        Effect::SendMessage {
            text: step.message.clone(),
            options: step.option_labels(),
        }
    }

    pub fn notice(notice: Notice, options: Vec<String>) -> Self {
        Effect::SendNotice { notice, options }
    }
}
