//! Per-chat conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: the
//! runtime owns all I/O and feeds outcomes back in as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Notice};
pub use event::Event;
pub use state::ChatState;
pub use transition::{transition, TransitionError, TransitionResult};
