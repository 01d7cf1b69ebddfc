//! Conversation configuration errors
//!
//! All of these are fatal: the process refuses to serve traffic when the
//! conversation file does not load or validate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read conversation file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid conversation file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Conversation file must be an array of conversations or an object with `steps`")]
    UnsupportedShape,
    #[error("Conversation file defines no conversations")]
    Empty,
    #[error("Duplicate conversation id: {0}")]
    DuplicateConversation(String),
    #[error("Conversation {0} has no triggers")]
    NoTriggers(String),
    #[error("Trigger {trigger:?} is shared by conversations {first} and {second}")]
    AmbiguousTrigger {
        trigger: String,
        first: String,
        second: String,
    },
    #[error("Duplicate step id {step} in conversation {conversation}")]
    DuplicateStep { conversation: String, step: String },
    #[error("Conversation {0} has no \"start\" step")]
    MissingStart(String),
    #[error("Step {step} in conversation {conversation} points at unknown step {target}")]
    DanglingTarget {
        conversation: String,
        step: String,
        target: String,
    },
    #[error("Step id {id:?} in conversation {conversation} contains a placeholder")]
    PlaceholderInId { conversation: String, id: String },
    #[error("{} configuration errors:\n{}", .0.len(), render_list(.0))]
    Multiple(Vec<ConfigError>),
}

fn render_list(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConfigError {
    /// Collapse a list of validation failures into a single error
    pub fn from_list(mut errors: Vec<ConfigError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ConfigError::Multiple(errors)),
        }
    }
}
