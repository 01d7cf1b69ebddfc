//! Reading conversation files from disk

use super::definition::{ConversationDefinition, LegacyConversation};
use super::ConfigError;
use super::registry::ConversationRegistry;
use serde_json::Value;
use std::path::Path;

/// Load, validate and index the conversation file at `path`
pub fn load_registry(path: &Path) -> Result<ConversationRegistry, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let conversations = parse_conversations(&raw)?;

    let registry = ConversationRegistry::new(conversations)?;
    for conversation in registry.iter() {
        tracing::debug!(
            conversation_id = %conversation.id,
            triggers = ?conversation.triggers,
            steps = conversation.steps.len(),
            "Registered conversation"
        );
    }
    tracing::info!(
        path = %path.display(),
        conversations = registry.len(),
        "Loaded conversation file"
    );
    Ok(registry)
}

/// Parse either accepted file shape into a list of conversations
pub fn parse_conversations(raw: &str) -> Result<Vec<ConversationDefinition>, ConfigError> {
    let value: Value = serde_json::from_str(raw)?;
    let is_legacy = value
        .as_object()
        .is_some_and(|map| map.contains_key("steps") && !map.contains_key("id"));

    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else if is_legacy {
        let legacy: LegacyConversation = serde_json::from_value(value)?;
        Ok(vec![legacy.into()])
    } else {
        Err(ConfigError::UnsupportedShape)
    }
}
