//! Conversation definition types, deserialized from the conversation file

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Id of the step every conversation enters first
pub const START_STEP_ID: &str = "start";

/// A named graph of steps, reachable through one or more trigger strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDefinition {
    pub id: String,
    #[serde(rename = "trigger", alias = "triggers")]
    pub triggers: Vec<String>,
    pub steps: Vec<Step>,
}

/// A node in a conversation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    /// Message template, may contain `{{ path }}` placeholders
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<StepOption>,
    /// Target for free-text input that matches no option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<MediaHeader>,
    #[serde(default)]
    pub end_journey: bool,
}

impl Step {
    /// Display labels of the options, in declared order
    pub fn option_labels(&self) -> Vec<String> {
        self.options.iter().map(|o| o.text.clone()).collect()
    }

    /// Every step id this step can transition to
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .map(|o| o.next_step_id.as_str())
            .chain(self.default_next_step.as_deref())
    }
}

/// A user-selectable choice binding display text to a target step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOption {
    /// Matched verbatim against inbound text
    pub text: String,
    #[serde(alias = "nextStep")]
    pub next_step_id: String,
}

/// Media sent ahead of a step's message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

/// HTTP method of an external action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
    #[serde(alias = "put")]
    Put,
    #[serde(alias = "patch")]
    Patch,
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Declarative external request bound to a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Query parameters; values are sent in their canonical string form
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ActionSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: None,
        }
    }
}

/// The older single-flow file shape: `{ "steps": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyConversation {
    pub steps: Vec<Step>,
}

/// Id and trigger given to a legacy single-flow file
pub const LEGACY_CONVERSATION_ID: &str = "default";
pub const LEGACY_TRIGGER: &str = "/start";

impl From<LegacyConversation> for ConversationDefinition {
    fn from(legacy: LegacyConversation) -> Self {
        Self {
            id: LEGACY_CONVERSATION_ID.to_string(),
            triggers: vec![LEGACY_TRIGGER.to_string()],
            steps: legacy.steps,
        }
    }
}
