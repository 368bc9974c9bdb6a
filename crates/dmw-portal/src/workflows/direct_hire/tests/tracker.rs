use std::collections::BTreeMap;
use std::sync::Arc;

use super::common::*;
use crate::workflows::direct_hire::documents::{
    Completion, DocumentError, DocumentKind, DocumentTracker, FileValidationError, UploadPolicy,
};
use crate::workflows::direct_hire::domain::ApplicationId;
use crate::workflows::direct_hire::gateway::{DocumentGateway, PortalGateway};

fn tracker_for(service: Arc<MemoryService>, id: &ApplicationId) -> DocumentTracker {
    let gateway: Arc<dyn DocumentGateway> = Arc::new(PortalGateway::new(service));
    let mut tracker = DocumentTracker::open(id.clone(), gateway, UploadPolicy::default());
    tracker.load_existing();
    tracker
}

#[test]
fn empty_tracker_requires_a_file_before_checking() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let mut tracker = tracker_for(service, &application.id);

    assert_eq!(tracker.completion(), Completion { completed: 0, total: 4 });
    assert_eq!(tracker.optional_completion(), Completion { completed: 0, total: 8 });

    let err = tracker
        .toggle_checked(DocumentKind::Passport, true)
        .expect_err("no file attached");
    assert_eq!(err, DocumentError::DocumentRequired(DocumentKind::Passport));
    assert!(err.to_string().starts_with("document required"));
    assert!(!tracker.entry(DocumentKind::Passport).checked);
}

#[test]
fn uploading_a_passport_checks_the_entry() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let mut tracker = tracker_for(service, &application.id);

    let mut meta = BTreeMap::new();
    meta.insert("passport_number".to_string(), "P1234567A".to_string());
    meta.insert("passport_expiry".to_string(), "2031-02-14".to_string());

    let entry = tracker
        .upload(DocumentKind::Passport, pdf("passport.pdf", 2 * MIB), Some(meta.clone()))
        .expect("upload succeeds")
        .clone();

    assert!(entry.checked);
    assert!(entry.file_id.is_some());
    assert_eq!(entry.file_name.as_deref(), Some("passport.pdf"));
    assert_eq!(entry.meta, meta);
    assert_eq!(tracker.completion(), Completion { completed: 1, total: 4 });
}

#[test]
fn oversized_file_is_rejected_without_state_change() {
    let (service, _, documents) = build_service();
    let application = created_application(&service);
    let mut tracker = tracker_for(service, &application.id);

    let err = tracker
        .select_file(DocumentKind::WorkVisa, png("visa.png", 6 * MIB))
        .expect_err("too large");
    assert!(matches!(
        err,
        DocumentError::InvalidFile(FileValidationError::TooLarge { .. })
    ));
    assert!(tracker.entry(DocumentKind::WorkVisa).staged.is_none());
    assert_eq!(tracker.completion(), Completion { completed: 0, total: 4 });
    assert_eq!(documents.count(), 0);
}

#[test]
fn staged_file_allows_checking_before_upload() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let mut tracker = tracker_for(service, &application.id);

    tracker
        .select_file(DocumentKind::MedicalCertificate, png("medical.png", 1024))
        .expect("valid file");
    tracker
        .toggle_checked(DocumentKind::MedicalCertificate, true)
        .expect("file attached");

    assert_eq!(tracker.optional_completion().completed, 1);
    assert_eq!(tracker.completion().completed, 0);
}

#[test]
fn load_existing_is_idempotent_and_matches_by_document_type() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    upload_required_documents(&service, &application.id);

    let mut tracker = tracker_for(service, &application.id);
    let first = tracker.entries().to_vec();
    tracker.load_existing();

    assert_eq!(tracker.entries(), first.as_slice());
    assert_eq!(tracker.completion(), Completion { completed: 4, total: 4 });
    assert!(tracker.requirements_satisfied().is_some());
    assert!(tracker.missing_required().is_empty());
}

#[test]
fn failed_lookup_falls_back_to_unchecked() {
    let mut tracker = DocumentTracker::open(
        ApplicationId("dh-offline".to_string()),
        Arc::new(OfflineDocuments),
        UploadPolicy::default(),
    );
    tracker.load_existing();

    assert_eq!(tracker.completion().completed, 0);
    assert!(tracker.entries().iter().all(|entry| !entry.checked));
    assert_eq!(tracker.missing_required().len(), 4);
}

#[test]
fn upload_failure_leaves_entry_unchecked_and_staged() {
    let mut tracker = DocumentTracker::open(
        ApplicationId("dh-offline".to_string()),
        Arc::new(OfflineDocuments),
        UploadPolicy::default(),
    );

    let err = tracker
        .upload(DocumentKind::EmploymentContract, pdf("contract.pdf", 4096), None)
        .expect_err("network down");
    assert!(matches!(
        err,
        DocumentError::Upload {
            kind: DocumentKind::EmploymentContract,
            ..
        }
    ));

    let entry = tracker.entry(DocumentKind::EmploymentContract);
    assert!(!entry.checked);
    assert!(entry.staged.is_some(), "file stays staged for a retry");
}

#[test]
fn metadata_outside_the_catalog_is_rejected_before_upload() {
    let (service, _, documents) = build_service();
    let application = created_application(&service);
    let mut tracker = tracker_for(service, &application.id);

    let mut meta = BTreeMap::new();
    meta.insert("passport_number".to_string(), "P1234567A".to_string());
    tracker
        .select_file(DocumentKind::TesdaLicense, pdf("nc2.pdf", 2048))
        .expect("valid file");
    let err = tracker
        .confirm_upload(DocumentKind::TesdaLicense, Some(meta))
        .expect_err("tesda license has no passport fields");

    assert!(matches!(err, DocumentError::InvalidMetadata(_)));
    assert_eq!(documents.count(), 0);
}
