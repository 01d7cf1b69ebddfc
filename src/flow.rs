//! Declarative conversation graphs
//!
//! Conversations are loaded once at startup, validated, and then served from
//! an immutable [`ConversationRegistry`].

mod definition;
mod error;
mod load;
mod registry;
mod validate;

pub use definition::{
    ActionSpec, ConversationDefinition, HttpMethod, MediaHeader, Step, StepOption,
    START_STEP_ID,
};
pub use error::ConfigError;
pub use load::load_registry;
pub use registry::{find_step, ConversationRegistry};
