//! HTTP implementation of the action executor

use super::{ActionError, ActionResult};
use crate::flow::{ActionSpec, HttpMethod};
use crate::runtime::ActionExecutor;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Executes actions as single HTTP requests with a fixed timeout
pub struct HttpActionExecutor {
    client: Client,
    timeout: Duration,
}

impl HttpActionExecutor {
    pub fn new(timeout: Duration) -> Result<Self, ActionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ActionError::invalid_spec(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    fn build_request(&self, spec: &ActionSpec) -> reqwest::RequestBuilder {
        let mut request = self.client.request(to_method(spec.method), &spec.url);
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }
        if !spec.params.is_empty() {
            let params: Vec<(&str, String)> = spec
                .params
                .iter()
                .map(|(k, v)| (k.as_str(), param_value(v)))
                .collect();
            request = request.query(&params);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }
        request
    }

    fn classify(&self, error: &reqwest::Error) -> ActionError {
        if error.is_timeout() {
            ActionError::timeout(self.timeout)
        } else if error.is_builder() {
            ActionError::invalid_spec(format!("Invalid action request: {error}"))
        } else {
            ActionError::network(format!("Action request failed: {error}"))
        }
    }

    async fn send(&self, spec: &ActionSpec) -> Result<ActionResult, ActionError> {
        let response = self
            .build_request(spec)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ActionError::timeout(self.timeout)
            } else {
                ActionError::decode(format!("Failed to read action response: {e}"))
            }
        })?;

        if !status.is_success() {
            return Err(ActionError::status(
                status.as_u16(),
                format!("{} {} returned {status}", spec.method.as_str(), spec.url),
            ));
        }

        let data = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(ActionResult {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data,
        })
    }
}

#[async_trait]
impl ActionExecutor for HttpActionExecutor {
    async fn execute(&self, spec: &ActionSpec) -> Result<ActionResult, ActionError> {
        let start = Instant::now();
        let result = self.send(spec).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    method = spec.method.as_str(),
                    url = %spec.url,
                    status = response.status,
                    duration_ms = %duration.as_millis(),
                    "Action completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    method = spec.method.as_str(),
                    url = %spec.url,
                    kind = e.kind.as_str(),
                    status = ?e.status,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    "Action failed"
                );
            }
        }

        result
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Query values go out in their canonical string form
fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
