//! Events that drive a chat's state machine

use crate::action::{ActionError, ActionResult};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Text typed or selected by the user
    Inbound { text: String },

    // Action outcomes, fed back by the runtime after `Effect::RunAction`
    ActionSucceeded {
        conversation_id: String,
        step_id: String,
        result: ActionResult,
    },
    ActionFailed {
        conversation_id: String,
        step_id: String,
        error: ActionError,
    },
}

impl Event {
    pub fn inbound(text: impl Into<String>) -> Self {
        Event::Inbound { text: text.into() }
    }
}
