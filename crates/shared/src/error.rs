use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::failure_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Transport,
    Service,
    Normalization,
}

/// Well-formed error response from the reconciliation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("service responded with HTTP {status}: {}", message.as_deref().unwrap_or("<no message>"))]
pub struct ServiceFailure {
    pub status: u16,
    pub message: Option<String>,
}

impl ServiceFailure {
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    pub fn from_body(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            message: failure_message(body),
        }
    }
}
