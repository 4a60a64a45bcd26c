//! Single-slot transient notifications with timed auto-dismissal.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};

pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub text: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl NotificationMessage {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity,
            created_at: Utc::now(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Severity::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }
}

/// Published state of the queue. `generation` changes on every enqueue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSlot {
    pub generation: u64,
    pub message: Option<NotificationMessage>,
}

/// Holds at most one active message. A new message replaces the current one and re-arms
/// the dismissal timer; the previous timer is aborted so it can never clear its successor.
pub struct NotificationQueue {
    slot: Arc<watch::Sender<NotificationSlot>>,
    timer: Option<JoinHandle<()>>,
    dismiss_after: Duration,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl NotificationQueue {
    pub fn new(dismiss_after: Duration) -> Self {
        let (slot, _) = watch::channel(NotificationSlot::default());
        Self {
            slot: Arc::new(slot),
            timer: None,
            dismiss_after,
        }
    }

    pub fn dismiss_after(&self) -> Duration {
        self.dismiss_after
    }

    /// The dismissal timer is a task on the current Tokio runtime. Outside a runtime the
    /// message stays until replaced or dismissed.
    pub fn enqueue(&mut self, message: NotificationMessage) {
        self.cancel_timer();

        let mut generation = 0;
        self.slot.send_modify(|slot| {
            slot.generation += 1;
            slot.message = Some(message);
            generation = slot.generation;
        });

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(generation, "no tokio runtime; notification will not auto-dismiss");
            return;
        };
        let slot = Arc::clone(&self.slot);
        let dismiss_after = self.dismiss_after;
        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(dismiss_after).await;
            let cleared = slot.send_if_modified(|current| {
                if current.generation != generation || current.message.is_none() {
                    return false;
                }
                current.message = None;
                true
            });
            if cleared {
                tracing::trace!(generation, "notification auto-dismissed");
            }
        }));
    }

    pub fn dismiss(&mut self) {
        self.cancel_timer();
        self.slot.send_if_modified(|slot| slot.message.take().is_some());
    }

    pub fn active(&self) -> Option<NotificationMessage> {
        self.slot.borrow().message.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationSlot> {
        self.slot.subscribe()
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
#[path = "tests/notification_tests.rs"]
mod tests;
