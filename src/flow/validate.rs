//! Load-time validation of conversation definitions

use super::definition::{ConversationDefinition, START_STEP_ID};
use super::error::ConfigError;
use crate::template::has_placeholders;
use std::collections::{HashMap, HashSet};

/// Check every structural invariant of a set of conversations.
///
/// Collects every violation instead of stopping at the first, so a broken
/// file can be fixed in one pass.
pub fn validate(conversations: &[ConversationDefinition]) -> Result<(), ConfigError> {
    if conversations.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut errors = Vec::new();
    let mut conversation_ids = HashSet::new();
    let mut trigger_owner: HashMap<&str, &str> = HashMap::new();

    for conversation in conversations {
        if !conversation_ids.insert(conversation.id.as_str()) {
            errors.push(ConfigError::DuplicateConversation(conversation.id.clone()));
        }

        if conversation.triggers.is_empty() {
            errors.push(ConfigError::NoTriggers(conversation.id.clone()));
        }

        for trigger in &conversation.triggers {
            match trigger_owner.get(trigger.as_str()) {
                Some(owner) if *owner != conversation.id => {
                    errors.push(ConfigError::AmbiguousTrigger {
                        trigger: trigger.clone(),
                        first: (*owner).to_string(),
                        second: conversation.id.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    trigger_owner.insert(trigger, &conversation.id);
                }
            }
        }

        validate_steps(conversation, &mut errors);
    }

    match ConfigError::from_list(errors) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn validate_steps(conversation: &ConversationDefinition, errors: &mut Vec<ConfigError>) {
    let mut step_ids = HashSet::new();
    for step in &conversation.steps {
        if !step_ids.insert(step.id.as_str()) {
            errors.push(ConfigError::DuplicateStep {
                conversation: conversation.id.clone(),
                step: step.id.clone(),
            });
        }
        if has_placeholders(&step.id) {
            errors.push(ConfigError::PlaceholderInId {
                conversation: conversation.id.clone(),
                id: step.id.clone(),
            });
        }
    }

    if !step_ids.contains(START_STEP_ID) {
        errors.push(ConfigError::MissingStart(conversation.id.clone()));
    }

    for step in &conversation.steps {
        for target in step.targets() {
            if has_placeholders(target) {
                errors.push(ConfigError::PlaceholderInId {
                    conversation: conversation.id.clone(),
                    id: target.to_string(),
                });
            } else if !step_ids.contains(target) {
                errors.push(ConfigError::DanglingTarget {
                    conversation: conversation.id.clone(),
                    step: step.id.clone(),
                    target: target.to_string(),
                });
            }
        }
    }
}
