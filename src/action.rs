//! External actions bound to steps
//!
//! An action is a single HTTP request. Its response becomes the data source
//! for the step's placeholders. Failed actions are never retried.

mod error;
mod http;

pub use error::{ActionError, ActionErrorKind};
pub use http::HttpActionExecutor;

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Raw outcome of a successful action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    /// Body parsed as JSON, or the raw text when it is not JSON
    pub data: Value,
}

impl ActionResult {
    /// A 200 response carrying `data`
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            headers: BTreeMap::new(),
            data,
        }
    }

    /// The template data source: `{status, statusText, headers, data}`
    pub fn to_source(&self) -> Value {
        let headers: Map<String, Value> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        json!({
            "status": self.status,
            "statusText": self.status_text,
            "headers": headers,
            "data": self.data,
        })
    }
}
