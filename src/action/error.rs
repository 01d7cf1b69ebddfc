//! External action error types

use std::time::Duration;
use thiserror::Error;

/// Action failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub message: String,
    /// HTTP status, when the server answered at all
    pub status: Option<u16>,
}

impl ActionError {
    pub fn new(kind: ActionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ActionErrorKind::Network, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ActionErrorKind::Timeout,
            format!("Action timed out after {}s", after.as_secs_f64()),
        )
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ActionErrorKind::Status,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ActionErrorKind::Decode, message)
    }

    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::new(ActionErrorKind::InvalidSpec, message)
    }
}

/// Error classification, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionErrorKind {
    /// Connection refused, DNS failure, reset
    Network,
    /// No response within the configured timeout
    Timeout,
    /// Server answered with a non-2xx status
    Status,
    /// Response body could not be read
    Decode,
    /// Request could not be built (bad URL, bad header)
    InvalidSpec,
}

impl ActionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionErrorKind::Network => "network",
            ActionErrorKind::Timeout => "timeout",
            ActionErrorKind::Status => "status",
            ActionErrorKind::Decode => "decode",
            ActionErrorKind::InvalidSpec => "invalid_spec",
        }
    }
}
