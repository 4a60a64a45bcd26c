//! Pure workflow transitions: model + action -> effects.
//!
//! The controller owns the model and executes the returned effects; nothing in here
//! performs I/O or touches timers.

use std::sync::Arc;

use shared::{
    domain::ReconciliationResult,
    error::{ErrorCategory, ServiceFailure},
};
use tracing::{info, warn};

use crate::{
    error::{ReconcileError, TransportError},
    file_slot::{FileSlot, SelectedFile, SlotKind},
    normalizer::ResponseNormalizer,
    notification::NotificationMessage,
    transport::TransportResponse,
};

pub const SUCCESS_MESSAGE: &str = "Reconciliation successful!";
pub const BUSY_MESSAGE: &str = "A reconciliation is already in progress.";

/// Monotonically increasing token; responses carrying an older token are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SubmissionId(pub u64);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Submitting {
        submission: SubmissionId,
    },
    Succeeded(Arc<ReconciliationResult>),
    Failed {
        message: String,
        category: ErrorCategory,
    },
}

impl WorkflowState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, WorkflowState::Submitting { .. })
    }

    pub fn result(&self) -> Option<&Arc<ReconciliationResult>> {
        match self {
            WorkflowState::Succeeded(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub submission: SubmissionId,
    pub invoice: SelectedFile,
    pub payout_summary: SelectedFile,
}

#[derive(Debug)]
pub enum WorkflowAction {
    SelectFile {
        slot: SlotKind,
        file: SelectedFile,
    },
    Reset,
    Submit,
    ResponseArrived {
        submission: SubmissionId,
        outcome: Result<TransportResponse, TransportError>,
    },
}

/// How a `submit` call settled, as seen by its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Succeeded(Arc<ReconciliationResult>),
    Failed(ReconcileError),
    /// Nothing was sent: a required file is missing.
    Rejected(ReconcileError),
    /// Nothing was sent: another submission is in flight.
    Busy,
    /// The response arrived after a reset or a newer submission and was ignored.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEffect {
    Notify(NotificationMessage),
    ClearNotification,
    SendRequest(SubmissionRequest),
    Discarded { submission: SubmissionId },
    Report(SubmitOutcome),
}

#[derive(Debug, Clone)]
pub struct WorkflowModel {
    pub hospital: FileSlot,
    pub insurer: FileSlot,
    pub phase: WorkflowState,
    last_submission: SubmissionId,
    in_flight: Option<SubmissionId>,
}

impl Default for WorkflowModel {
    fn default() -> Self {
        Self {
            hospital: FileSlot::new(SlotKind::HospitalInvoice),
            insurer: FileSlot::new(SlotKind::InsurerPayoutSummary),
            phase: WorkflowState::Idle,
            last_submission: SubmissionId::default(),
            in_flight: None,
        }
    }
}

impl WorkflowModel {
    pub fn slot(&self, kind: SlotKind) -> &FileSlot {
        match kind {
            SlotKind::HospitalInvoice => &self.hospital,
            SlotKind::InsurerPayoutSummary => &self.insurer,
        }
    }

    fn slot_mut(&mut self, kind: SlotKind) -> &mut FileSlot {
        match kind {
            SlotKind::HospitalInvoice => &mut self.hospital,
            SlotKind::InsurerPayoutSummary => &mut self.insurer,
        }
    }

    /// Hospital is checked before insurer; only the first gap is reported.
    pub fn first_missing_slot(&self) -> Option<SlotKind> {
        SlotKind::ALL
            .into_iter()
            .find(|kind| self.slot(*kind).is_empty())
    }

    pub fn in_flight(&self) -> Option<SubmissionId> {
        self.in_flight
    }

    pub fn last_submission(&self) -> SubmissionId {
        self.last_submission
    }
}

pub fn reduce(
    model: &mut WorkflowModel,
    action: WorkflowAction,
    normalizer: &ResponseNormalizer,
) -> Vec<WorkflowEffect> {
    match action {
        WorkflowAction::SelectFile { slot, file } => {
            model.slot_mut(slot).set(file);
            Vec::new()
        }
        WorkflowAction::Reset => {
            model.hospital.clear();
            model.insurer.clear();
            model.phase = WorkflowState::Idle;
            model.in_flight = None;
            vec![WorkflowEffect::ClearNotification]
        }
        WorkflowAction::Submit => reduce_submit(model),
        WorkflowAction::ResponseArrived {
            submission,
            outcome,
        } => reduce_response(model, submission, outcome, normalizer),
    }
}

fn reduce_submit(model: &mut WorkflowModel) -> Vec<WorkflowEffect> {
    if model.phase.is_submitting() {
        return vec![
            WorkflowEffect::Notify(NotificationMessage::info(BUSY_MESSAGE)),
            WorkflowEffect::Report(SubmitOutcome::Busy),
        ];
    }

    let (Some(invoice), Some(payout_summary)) = (model.hospital.file(), model.insurer.file())
    else {
        let missing = model
            .first_missing_slot()
            .unwrap_or(SlotKind::HospitalInvoice);
        let err = ReconcileError::Validation { missing };
        return vec![
            WorkflowEffect::Notify(NotificationMessage::error(err.user_message())),
            WorkflowEffect::Report(SubmitOutcome::Rejected(err)),
        ];
    };

    let request = SubmissionRequest {
        submission: SubmissionId(model.last_submission.0 + 1),
        invoice: invoice.clone(),
        payout_summary: payout_summary.clone(),
    };
    model.last_submission = request.submission;
    model.in_flight = Some(request.submission);
    model.phase = WorkflowState::Submitting {
        submission: request.submission,
    };

    vec![
        WorkflowEffect::ClearNotification,
        WorkflowEffect::SendRequest(request),
    ]
}

fn reduce_response(
    model: &mut WorkflowModel,
    submission: SubmissionId,
    outcome: Result<TransportResponse, TransportError>,
    normalizer: &ResponseNormalizer,
) -> Vec<WorkflowEffect> {
    if model.in_flight != Some(submission) {
        info!(%submission, "discarding response for superseded submission");
        return vec![
            WorkflowEffect::Discarded { submission },
            WorkflowEffect::Report(SubmitOutcome::Superseded),
        ];
    }
    model.in_flight = None;

    match interpret_response(submission, outcome, normalizer) {
        Ok(result) => {
            let result = Arc::new(result);
            model.phase = WorkflowState::Succeeded(Arc::clone(&result));
            vec![
                WorkflowEffect::Notify(NotificationMessage::success(SUCCESS_MESSAGE)),
                WorkflowEffect::Report(SubmitOutcome::Succeeded(result)),
            ]
        }
        Err(err) => {
            let message = err.user_message();
            model.phase = WorkflowState::Failed {
                message: message.clone(),
                category: err.category(),
            };
            vec![
                WorkflowEffect::Notify(NotificationMessage::error(message)),
                WorkflowEffect::Report(SubmitOutcome::Failed(err)),
            ]
        }
    }
}

fn interpret_response(
    submission: SubmissionId,
    outcome: Result<TransportResponse, TransportError>,
    normalizer: &ResponseNormalizer,
) -> Result<ReconciliationResult, ReconcileError> {
    let response = outcome.map_err(|err| {
        warn!(%submission, error = %err, "reconciliation request failed in transport");
        ReconcileError::from(err)
    })?;

    if !response.is_success() {
        let failure = ServiceFailure::from_body(response.status, &response.body);
        warn!(
            %submission,
            status = response.status,
            message = failure.message.as_deref().unwrap_or_default(),
            "reconciliation service returned an error response"
        );
        return Err(failure.into());
    }

    let result = normalizer.normalize(&response.body).map_err(|err| {
        warn!(%submission, error = %err, "reconciliation response could not be normalized");
        ReconcileError::from(err)
    })?;
    info!(
        %submission,
        line_items = result.line_items.len(),
        "reconciliation succeeded"
    );
    Ok(result)
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
