use super::*;

#[test]
fn set_replaces_previous_file() {
    let mut slot = FileSlot::new(SlotKind::HospitalInvoice);
    assert!(slot.is_empty());

    slot.set(SelectedFile::new("first.pdf", b"one".to_vec()));
    slot.set(SelectedFile::new("second.png", b"two".to_vec()));

    let file = slot.file().expect("file");
    assert_eq!(file.name, "second.png");
    assert_eq!(file.mime_type, "image/png");
    assert!(!slot.is_empty());

    slot.clear();
    assert!(slot.is_empty());
    assert_eq!(slot.label(), "Hospital Invoice");
}

#[test]
fn unknown_extension_falls_back_to_octet_stream() {
    let file = SelectedFile::new("notes", b"raw".to_vec());
    assert_eq!(file.mime_type, "application/octet-stream");
    assert_eq!(file.size_bytes(), 3);
}

#[test]
fn selection_filter_lists_accepted_extensions() {
    assert_eq!(selection_filter(), ".pdf,.jpg,.jpeg,.png");
    assert!(is_accepted_file("invoice.PDF"));
    assert!(is_accepted_file("/tmp/scan.jpeg"));
    assert!(!is_accepted_file("summary.txt"));
    assert!(!is_accepted_file("no_extension"));
}

#[test]
fn hospital_slot_is_checked_first() {
    assert_eq!(SlotKind::ALL[0], SlotKind::HospitalInvoice);
    assert_eq!(SlotKind::InsurerPayoutSummary.label(), "Insurer Payout Summary");
}

#[tokio::test]
async fn from_path_reads_bytes_and_guesses_mime() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("invoice.pdf");
    std::fs::write(&path, b"%PDF-1.4").expect("write");

    let file = SelectedFile::from_path(&path).await.expect("read");
    assert_eq!(file.name, "invoice.pdf");
    assert_eq!(file.mime_type, "application/pdf");
    assert_eq!(file.bytes, b"%PDF-1.4".to_vec());
}

#[tokio::test]
async fn from_path_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = SelectedFile::from_path(dir.path().join("missing.pdf"))
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("missing.pdf"));
}
