//! Mock reconciliation service and a recording in-process transport.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    error::TransportError,
    reducer::SubmissionRequest,
    transport::{ReconciliationTransport, TransportResponse},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPart {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct CapturedRequest {
    pub accept: Option<String>,
    pub request_id: Option<String>,
    pub parts: Vec<CapturedPart>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub struct MockService {
    pub endpoint: String,
    pub captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub async fn spawn_reconcile_server(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
) -> MockService {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        body,
        delay,
        captured: Arc::clone(&captured),
    };
    let app = Router::new()
        .route("/reconcile", post(reconcile))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockService {
        endpoint: format!("http://{addr}/reconcile"),
        captured,
    }
}

async fn reconcile(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, &'static str) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let mut request = CapturedRequest {
        accept: header("accept"),
        request_id: header("x-request-id"),
        parts: Vec::new(),
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        request.parts.push(CapturedPart {
            field: field_name,
            file_name,
            content_type,
            bytes,
        });
    }
    state.captured.lock().await.push(request);

    tokio::time::sleep(state.delay).await;
    (state.status, state.body)
}

/// Transport that answers from a canned outcome and counts calls.
pub struct RecordingTransport {
    outcome: Result<TransportResponse, TransportError>,
    delay: Duration,
    calls: AtomicUsize,
    pub requests: Mutex<Vec<SubmissionRequest>>,
}

impl RecordingTransport {
    pub fn responding(outcome: Result<TransportResponse, TransportError>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReconciliationTransport for RecordingTransport {
    async fn send(&self, request: SubmissionRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}
