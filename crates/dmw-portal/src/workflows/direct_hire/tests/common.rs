use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::direct_hire::documents::{DocumentUpload, UploadFile, UploadPolicy};
use crate::workflows::direct_hire::domain::{
    ApplicationId, ApplicationType, ChecklistSnapshot, DirectHireApplication,
    DirectHireSubmission, DocumentId, DocumentSummary, Sex, StatusChecklist, UploadReceipt,
};
use crate::workflows::direct_hire::gateway::{
    ApplicationGateway, DocumentGateway, GatewayError, Notification, NotificationLevel, Notifier,
    PortalCollaborators, PortalGateway,
};
use crate::workflows::direct_hire::repository::{
    ApplicationRepository, DocumentRecord, DocumentRepository, RepositoryError,
};
use crate::workflows::direct_hire::salary::{Currency, MonetaryAmount};
use crate::workflows::direct_hire::service::DirectHireService;
use crate::workflows::direct_hire::DocumentKind;

pub(super) const MIB: usize = 1024 * 1024;

pub(super) type MemoryService = DirectHireService<MemoryApplications, MemoryDocuments>;

pub(super) fn submission() -> DirectHireSubmission {
    DirectHireSubmission {
        name: "Maria Santos".to_string(),
        sex: Sex::Female,
        position: "Staff Nurse".to_string(),
        job_site: "Riyadh, Saudi Arabia".to_string(),
        employer: "King Faisal Specialist Hospital".to_string(),
        salary: MonetaryAmount::new(9500.0, Currency::Sar),
    }
}

pub(super) fn pdf(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, mime::APPLICATION_PDF, vec![0x25; size])
}

pub(super) fn png(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, mime::IMAGE_PNG, vec![0x89; size])
}

pub(super) fn build_service() -> (Arc<MemoryService>, Arc<MemoryApplications>, Arc<MemoryDocuments>) {
    let applications = Arc::new(MemoryApplications::default());
    let documents = Arc::new(MemoryDocuments::default());
    let service = Arc::new(DirectHireService::new(
        applications.clone(),
        documents.clone(),
        UploadPolicy::default(),
    ));
    (service, applications, documents)
}

pub(super) fn created_application(service: &MemoryService) -> DirectHireApplication {
    service.create(submission()).expect("application created")
}

pub(super) fn upload_required_documents(service: &MemoryService, id: &ApplicationId) {
    for kind in DocumentKind::required_kinds() {
        service
            .upload_document(DocumentUpload {
                application_id: id.clone(),
                application_type: ApplicationType::DirectHire,
                document_name: kind.key().to_string(),
                file: pdf(&format!("{}.pdf", kind.key()), 1024),
                meta: None,
            })
            .expect("upload succeeds");
    }
}

pub(super) fn in_process(
    service: Arc<MemoryService>,
) -> (PortalCollaborators, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let gateway = Arc::new(PortalGateway::new(service));
    (
        PortalCollaborators::in_process(gateway, notifier.clone()),
        notifier,
    )
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, DirectHireApplication>>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(
        &self,
        record: DirectHireApplication,
    ) -> Result<DirectHireApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_if_version(
        &self,
        record: DirectHireApplication,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::VersionChanged {
                current: stored.version,
            });
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<DirectHireApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDocuments {
    pub(super) records: Arc<Mutex<Vec<DocumentRecord>>>,
}

impl MemoryDocuments {
    pub(super) fn count(&self) -> usize {
        self.records.lock().expect("document mutex poisoned").len()
    }
}

impl DocumentRepository for MemoryDocuments {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("document mutex poisoned");
        guard.push(record.clone());
        Ok(record)
    }

    fn list(
        &self,
        application_id: &ApplicationId,
        application_type: ApplicationType,
    ) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("document mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| {
                &record.application_id == application_id
                    && record.application_type == application_type
            })
            .cloned()
            .collect())
    }

    fn remove(&self, id: &DocumentId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("document mutex poisoned");
        guard.retain(|record| &record.id != id);
        Ok(())
    }
}

/// Holds the first two reads at a barrier so both callers work from the
/// same stored version before either writes.
pub(super) struct RacingApplications {
    inner: MemoryApplications,
    barrier: Barrier,
    reads: AtomicUsize,
}

impl RacingApplications {
    pub(super) fn new(inner: MemoryApplications) -> Self {
        Self {
            inner,
            barrier: Barrier::new(2),
            reads: AtomicUsize::new(0),
        }
    }
}

impl ApplicationRepository for RacingApplications {
    fn insert(
        &self,
        record: DirectHireApplication,
    ) -> Result<DirectHireApplication, RepositoryError> {
        self.inner.insert(record)
    }

    fn update_if_version(
        &self,
        record: DirectHireApplication,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        self.inner.update_if_version(record, expected_version)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<DirectHireApplication>, RepositoryError> {
        let record = self.inner.fetch(id)?;
        if self.reads.fetch_add(1, Ordering::SeqCst) < 2 {
            self.barrier.wait();
        }
        Ok(record)
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(
        &self,
        _record: DirectHireApplication,
    ) -> Result<DirectHireApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_if_version(
        &self,
        _record: DirectHireApplication,
        _expected_version: u64,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<DirectHireApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn count(&self, level: NotificationLevel) -> usize {
        self.events()
            .iter()
            .filter(|event| event.level == level)
            .count()
    }

    pub(super) fn last(&self) -> Option<Notification> {
        self.events().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
    }
}

/// Document collaborator that is always offline.
pub(super) struct OfflineDocuments;

impl DocumentGateway for OfflineDocuments {
    fn list_documents(
        &self,
        _application_id: &ApplicationId,
        _application_type: ApplicationType,
    ) -> Result<Vec<DocumentSummary>, GatewayError> {
        Err(GatewayError::Unavailable("network error".to_string()))
    }

    fn upload_document(&self, _upload: DocumentUpload) -> Result<UploadReceipt, GatewayError> {
        Err(GatewayError::Unavailable("network error".to_string()))
    }
}

/// Application collaborator whose writes fail.
pub(super) struct ReadOnlyApplications {
    pub(super) snapshot: ChecklistSnapshot,
}

impl ApplicationGateway for ReadOnlyApplications {
    fn fetch_checklist(
        &self,
        _application_id: &ApplicationId,
    ) -> Result<ChecklistSnapshot, GatewayError> {
        Ok(self.snapshot)
    }

    fn persist_checklist(
        &self,
        _application_id: &ApplicationId,
        _checklist: &StatusChecklist,
        _expected_version: Option<u64>,
    ) -> Result<ChecklistSnapshot, GatewayError> {
        Err(GatewayError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
