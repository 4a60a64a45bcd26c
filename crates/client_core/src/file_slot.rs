//! Holders for the two user-selected documents.

use std::path::Path;

use anyhow::{Context, Result};

/// Extensions offered by the selection dialog. Content validity is checked by the service.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    HospitalInvoice,
    InsurerPayoutSummary,
}

impl SlotKind {
    /// Order in which slots are checked before a submission.
    pub const ALL: [SlotKind; 2] = [SlotKind::HospitalInvoice, SlotKind::InsurerPayoutSummary];

    pub fn label(self) -> &'static str {
        match self {
            SlotKind::HospitalInvoice => "Hospital Invoice",
            SlotKind::InsurerPayoutSummary => "Insurer Payout Summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_raw()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document.bin")
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        Ok(Self::new(name, bytes))
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Selection-dialog filter string, e.g. for an `accept` attribute.
pub fn selection_filter() -> String {
    ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn is_accepted_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// A named holder for at most one selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSlot {
    kind: SlotKind,
    content: Option<SelectedFile>,
}

impl FileSlot {
    pub fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            content: None,
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn set(&mut self, file: SelectedFile) {
        self.content = Some(file);
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.content.as_ref()
    }
}

#[cfg(test)]
#[path = "tests/file_slot_tests.rs"]
mod tests;
