//! Upload-and-reconcile workflow controller.
//!
//! Owns the two file slots, the workflow phase and the notification queue. All mutation
//! goes through [`reduce`]; the lock is released while a request is on the wire so file
//! selection and reset stay responsive during a submission.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use shared::domain::ReconciliationResult;
use tokio::sync::watch;
use tracing::debug;

use crate::{
    config::ClientSettings,
    error::TransportError,
    file_slot::{SelectedFile, SlotKind},
    normalizer::ResponseNormalizer,
    notification::{NotificationMessage, NotificationQueue, NotificationSlot},
    reducer::{
        reduce, SubmissionId, SubmitOutcome, WorkflowAction, WorkflowEffect, WorkflowModel,
        WorkflowState,
    },
    transport::{HttpTransport, ReconciliationTransport},
};

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    pub phase: WorkflowState,
    pub hospital_file: Option<String>,
    pub insurer_file: Option<String>,
    pub notification: Option<NotificationMessage>,
}

impl WorkflowSnapshot {
    pub fn result(&self) -> Option<&Arc<ReconciliationResult>> {
        self.phase.result()
    }
}

struct ControllerInner {
    model: WorkflowModel,
    notifications: NotificationQueue,
}

pub struct ReconciliationController<T: ReconciliationTransport> {
    transport: T,
    normalizer: ResponseNormalizer,
    inner: Mutex<ControllerInner>,
    phase: watch::Sender<WorkflowState>,
}

impl ReconciliationController<HttpTransport> {
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(
            settings.endpoint.clone(),
            settings.field_names(),
            settings.request_timeout(),
        )?;
        Ok(Self::with_dismiss_after(
            transport,
            settings.notification_dismiss_after(),
        ))
    }
}

impl<T: ReconciliationTransport> ReconciliationController<T> {
    pub fn new(transport: T) -> Self {
        Self::with_dismiss_after(transport, crate::notification::DEFAULT_DISMISS_AFTER)
    }

    pub fn with_dismiss_after(transport: T, dismiss_after: Duration) -> Self {
        let (phase, _) = watch::channel(WorkflowState::Idle);
        Self {
            transport,
            normalizer: ResponseNormalizer::default(),
            inner: Mutex::new(ControllerInner {
                model: WorkflowModel::default(),
                notifications: NotificationQueue::new(dismiss_after),
            }),
            phase,
        }
    }

    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Legal in every phase; does not clear a displayed result.
    pub fn select_file(&self, slot: SlotKind, file: SelectedFile) {
        debug!(slot = slot.label(), file = %file.name, size = file.size_bytes(), "file selected");
        self.dispatch(WorkflowAction::SelectFile { slot, file });
    }

    /// Back to `Idle` with empty slots and no notification. A response still in flight
    /// is ignored when it arrives.
    pub fn reset(&self) {
        self.dispatch(WorkflowAction::Reset);
    }

    pub fn dismiss_notification(&self) {
        self.inner.lock().notifications.dismiss();
    }

    /// Runs one submission. Always leaves `Submitting` before returning, and also when
    /// the returned future is dropped mid-request.
    pub async fn submit(&self) -> SubmitOutcome {
        let mut request = None;
        let mut outcome = None;
        for effect in self.dispatch(WorkflowAction::Submit) {
            match effect {
                WorkflowEffect::SendRequest(pending) => request = Some(pending),
                WorkflowEffect::Report(reported) => outcome = Some(reported),
                _ => {}
            }
        }
        let Some(request) = request else {
            return outcome.unwrap_or(SubmitOutcome::Busy);
        };

        let mut guard = InFlight {
            controller: self,
            submission: request.submission,
            settled: false,
        };
        let response = self.transport.send(request).await;
        guard.settled = true;

        report(self.dispatch(WorkflowAction::ResponseArrived {
            submission: guard.submission,
            outcome: response,
        }))
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.inner.lock();
        WorkflowSnapshot {
            phase: inner.model.phase.clone(),
            hospital_file: inner.model.hospital.file().map(|file| file.name.clone()),
            insurer_file: inner.model.insurer.file().map(|file| file.name.clone()),
            notification: inner.notifications.active(),
        }
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<WorkflowState> {
        self.phase.subscribe()
    }

    pub fn subscribe_notifications(&self) -> watch::Receiver<NotificationSlot> {
        self.inner.lock().notifications.subscribe()
    }

    /// Reduces `action` and applies notification effects under one lock, so phase and
    /// notification change together. Remaining effects are returned to the caller.
    fn dispatch(&self, action: WorkflowAction) -> Vec<WorkflowEffect> {
        let mut inner = self.inner.lock();
        let effects = reduce(&mut inner.model, action, &self.normalizer);

        let mut pending = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                WorkflowEffect::Notify(message) => inner.notifications.enqueue(message),
                WorkflowEffect::ClearNotification => inner.notifications.dismiss(),
                other => pending.push(other),
            }
        }

        let phase = &inner.model.phase;
        self.phase.send_if_modified(|published| {
            if published == phase {
                return false;
            }
            *published = phase.clone();
            true
        });
        pending
    }
}

fn report(effects: Vec<WorkflowEffect>) -> SubmitOutcome {
    effects
        .into_iter()
        .find_map(|effect| match effect {
            WorkflowEffect::Report(outcome) => Some(outcome),
            _ => None,
        })
        .unwrap_or(SubmitOutcome::Superseded)
}

/// Settles a submission whose `submit` future was dropped before the response arrived.
struct InFlight<'a, T: ReconciliationTransport> {
    controller: &'a ReconciliationController<T>,
    submission: SubmissionId,
    settled: bool,
}

impl<T: ReconciliationTransport> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        debug!(submission = %self.submission, "submission cancelled before response");
        self.controller.dispatch(WorkflowAction::ResponseArrived {
            submission: self.submission,
            outcome: Err(TransportError::Cancelled),
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
