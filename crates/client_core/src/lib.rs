//! Client-side upload-and-reconcile workflow for hospital invoices and insurer payout
//! summaries.

pub mod config;
pub mod controller;
pub mod error;
pub mod file_slot;
pub mod normalizer;
pub mod notification;
pub mod reducer;
pub mod transport;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

pub use config::{load_settings, ClientSettings};
pub use controller::{ReconciliationController, WorkflowSnapshot};
pub use error::{NormalizationError, ReconcileError, TransportError};
pub use file_slot::{is_accepted_file, selection_filter, FileSlot, SelectedFile, SlotKind};
pub use normalizer::{ResponseNormalizer, ShapeMatcher};
pub use notification::{NotificationMessage, NotificationQueue, Severity};
pub use reducer::{SubmissionId, SubmitOutcome, WorkflowState};
pub use transport::{HttpTransport, MultipartFieldNames, ReconciliationTransport, TransportResponse};
