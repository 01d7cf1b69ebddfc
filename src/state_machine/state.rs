//! Chat state types

use crate::session::Session;

/// Where a chat stands between turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChatState {
    /// No session: the next message is matched against triggers
    #[default]
    Idle,

    /// Session points at a step of a conversation
    InStep {
        conversation_id: String,
        step_id: String,
    },
}

impl ChatState {
    pub fn in_step(conversation_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        ChatState::InStep {
            conversation_id: conversation_id.into(),
            step_id: step_id.into(),
        }
    }

    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(s) => ChatState::in_step(&s.conversation_id, &s.current_step_id),
            None => ChatState::Idle,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ChatState::Idle => "idle",
            ChatState::InStep { .. } => "in_step",
        }
    }
}
