//! Immutable index of conversations by id and by trigger

use super::definition::{ConversationDefinition, Step};
use super::ConfigError;
use super::validate::validate;
use std::collections::HashMap;

/// Load-time index of every conversation definition.
///
/// Read-only after construction, so it is shared between turns behind an
/// `Arc` without locking.
#[derive(Debug, Clone)]
pub struct ConversationRegistry {
    conversations: Vec<ConversationDefinition>,
    by_id: HashMap<String, usize>,
    by_trigger: HashMap<String, usize>,
}

impl ConversationRegistry {
    /// Validate and index the given conversations
    pub fn new(conversations: Vec<ConversationDefinition>) -> Result<Self, ConfigError> {
        validate(&conversations)?;

        let mut by_id = HashMap::with_capacity(conversations.len());
        let mut by_trigger = HashMap::new();
        for (index, conversation) in conversations.iter().enumerate() {
            by_id.insert(conversation.id.clone(), index);
            for trigger in &conversation.triggers {
                // First registration wins; validation already rejected conflicts
                by_trigger.entry(trigger.clone()).or_insert(index);
            }
        }

        Ok(Self {
            conversations,
            by_id,
            by_trigger,
        })
    }

    /// Conversation whose trigger set contains exactly `text`
    pub fn find_by_trigger(&self, text: &str) -> Option<&ConversationDefinition> {
        self.by_trigger
            .get(text)
            .map(|&index| &self.conversations[index])
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ConversationDefinition> {
        self.by_id.get(id).map(|&index| &self.conversations[index])
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationDefinition> {
        self.conversations.iter()
    }
}

/// Exact-id step lookup within a single conversation
pub fn find_step<'a>(step_id: &str, conversation: &'a ConversationDefinition) -> Option<&'a Step> {
    conversation.steps.iter().find(|step| step.id == step_id)
}
