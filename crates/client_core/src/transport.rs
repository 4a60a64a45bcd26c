//! Network seam between the controller and the reconciliation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::ACCEPT,
    multipart::{Form, Part},
    Client,
};
use serde_json::Value;
use shared::protocol::{DEFAULT_INVOICE_FIELD, DEFAULT_PAYOUT_SUMMARY_FIELD};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::TransportError,
    file_slot::SelectedFile,
    reducer::SubmissionRequest,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A received HTTP response whose body decoded as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ReconciliationTransport: Send + Sync {
    /// Sends one submission. Exactly one attempt; no retries.
    async fn send(&self, request: SubmissionRequest) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFieldNames {
    pub invoice: String,
    pub payout_summary: String,
}

impl Default for MultipartFieldNames {
    fn default() -> Self {
        Self {
            invoice: DEFAULT_INVOICE_FIELD.to_string(),
            payout_summary: DEFAULT_PAYOUT_SUMMARY_FIELD.to_string(),
        }
    }
}

pub struct HttpTransport {
    http: Client,
    endpoint: String,
    fields: MultipartFieldNames,
}

impl HttpTransport {
    pub fn new(
        endpoint: impl Into<String>,
        fields: MultipartFieldNames,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let endpoint = endpoint.into();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Request {
                endpoint: endpoint.clone(),
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint,
            fields,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                endpoint: self.endpoint.clone(),
            }
        } else {
            TransportError::Request {
                endpoint: self.endpoint.clone(),
                message: err.to_string(),
            }
        }
    }

    fn file_part(&self, file: SelectedFile) -> Result<Part, TransportError> {
        Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.mime_type)
            .map_err(|err| self.request_error(err))
    }
}

#[async_trait]
impl ReconciliationTransport for HttpTransport {
    async fn send(&self, request: SubmissionRequest) -> Result<TransportResponse, TransportError> {
        let request_id = Uuid::new_v4();
        let form = Form::new()
            .part(self.fields.invoice.clone(), self.file_part(request.invoice)?)
            .part(
                self.fields.payout_summary.clone(),
                self.file_part(request.payout_summary)?,
            );

        debug!(
            submission = %request.submission,
            %request_id,
            endpoint = %self.endpoint,
            "posting reconciliation request"
        );
        let response = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .multipart(form)
            .send()
            .await
            .map_err(|err| self.request_error(err))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.request_error(err))?;
        debug!(
            submission = %request.submission,
            %request_id,
            status,
            body_len = bytes.len(),
            "reconciliation response received"
        );

        let body = serde_json::from_slice(&bytes).map_err(|err| TransportError::MalformedBody {
            endpoint: self.endpoint.clone(),
            status,
            message: err.to_string(),
        })?;
        Ok(TransportResponse::new(status, body))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
