use shared::error::{ErrorCategory, ServiceFailure};
use thiserror::Error;

use crate::file_slot::SlotKind;

pub const TRANSPORT_FAILURE_MESSAGE: &str = "Upload failed, please try again.";
pub const SERVICE_FAILURE_FALLBACK: &str = "Something went wrong.";
pub const NORMALIZATION_FAILURE_MESSAGE: &str =
    "The reconciliation response could not be read, please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("response payload does not match any known shape")]
    UnrecognizedShape,
    #[error("{shape} response is missing required field `{field}`")]
    MissingField { shape: &'static str, field: String },
    #[error("{shape} response has invalid `{field}`: {reason}")]
    InvalidField {
        shape: &'static str,
        field: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },
    #[error("request was cancelled before a response arrived")]
    Cancelled,
    #[error("response from {endpoint} (HTTP {status}) is not valid JSON: {message}")]
    MalformedBody {
        endpoint: String,
        status: u16,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("missing required file: {}", missing.label())]
    Validation { missing: SlotKind },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Service(#[from] ServiceFailure),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl ReconcileError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReconcileError::Validation { .. } => ErrorCategory::Validation,
            ReconcileError::Transport(_) => ErrorCategory::Transport,
            ReconcileError::Service(_) => ErrorCategory::Service,
            ReconcileError::Normalization(_) => ErrorCategory::Normalization,
        }
    }

    /// Text shown to the user in the error notification.
    pub fn user_message(&self) -> String {
        match self {
            ReconcileError::Validation { missing } => {
                format!("Please upload the missing file: {}", missing.label())
            }
            ReconcileError::Transport(_) => TRANSPORT_FAILURE_MESSAGE.to_string(),
            ReconcileError::Service(failure) => failure
                .message
                .clone()
                .unwrap_or_else(|| SERVICE_FAILURE_FALLBACK.to_string()),
            ReconcileError::Normalization(_) => NORMALIZATION_FAILURE_MESSAGE.to_string(),
        }
    }
}
