//! Collaborator seams used by the checklist coordinator and document tracker.
//!
//! Each trait mirrors one portal endpoint. `PortalGateway` satisfies all of them
//! in-process on top of [`DirectHireService`] so the same rules apply whether the
//! coordinator runs next to the service or behind HTTP.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationType, ChecklistSnapshot, DocumentSummary, GeneratedDocument,
    StatusChecklist, UploadReceipt,
};
use super::documents::DocumentUpload;
use super::repository::{ApplicationRepository, DocumentRepository, RepositoryError};
use super::service::{DirectHireService, PortalServiceError};

/// Error surfaced by a collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("application not found")]
    NotFound,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// `GET /api/documents` and `POST /api/documents/upload`.
pub trait DocumentGateway: Send + Sync {
    fn list_documents(
        &self,
        application_id: &ApplicationId,
        application_type: ApplicationType,
    ) -> Result<Vec<DocumentSummary>, GatewayError>;

    fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt, GatewayError>;
}

/// `GET`/`PATCH /api/direct-hire/{id}`.
pub trait ApplicationGateway: Send + Sync {
    fn fetch_checklist(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ChecklistSnapshot, GatewayError>;

    fn persist_checklist(
        &self,
        application_id: &ApplicationId,
        checklist: &StatusChecklist,
        expected_version: Option<u64>,
    ) -> Result<ChecklistSnapshot, GatewayError>;
}

/// `POST /api/direct-hire/{id}/evaluation-checklist`.
pub trait ChecklistGenerator: Send + Sync {
    /// Returns `GatewayError::Conflict` when a generated checklist exists and
    /// `override_existing` is false.
    fn generate_evaluation_checklist(
        &self,
        application_id: &ApplicationId,
        override_existing: bool,
    ) -> Result<GeneratedDocument, GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient, user-facing message raised by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Bundle of collaborators handed to the coordinator.
#[derive(Clone)]
pub struct PortalCollaborators {
    pub applications: Arc<dyn ApplicationGateway>,
    pub documents: Arc<dyn DocumentGateway>,
    pub generator: Arc<dyn ChecklistGenerator>,
    pub notifier: Arc<dyn Notifier>,
}

impl PortalCollaborators {
    /// Wires every seam to one in-process gateway.
    pub fn in_process<A, D>(gateway: Arc<PortalGateway<A, D>>, notifier: Arc<dyn Notifier>) -> Self
    where
        A: ApplicationRepository + 'static,
        D: DocumentRepository + 'static,
    {
        Self {
            applications: gateway.clone(),
            documents: gateway.clone(),
            generator: gateway,
            notifier,
        }
    }
}

/// In-process adapter over the portal service.
pub struct PortalGateway<A, D> {
    service: Arc<DirectHireService<A, D>>,
}

impl<A, D> PortalGateway<A, D>
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    pub fn new(service: Arc<DirectHireService<A, D>>) -> Self {
        Self { service }
    }
}

impl From<PortalServiceError> for GatewayError {
    fn from(value: PortalServiceError) -> Self {
        match value {
            PortalServiceError::Repository(RepositoryError::NotFound) => GatewayError::NotFound,
            PortalServiceError::Repository(RepositoryError::Unavailable(reason)) => {
                GatewayError::Unavailable(reason)
            }
            err @ (PortalServiceError::Repository(RepositoryError::Conflict)
            | PortalServiceError::Repository(RepositoryError::VersionChanged { .. })
            | PortalServiceError::StaleVersion { .. }
            | PortalServiceError::ChecklistDocumentExists) => {
                GatewayError::Conflict(err.to_string())
            }
            other => GatewayError::Rejected(other.to_string()),
        }
    }
}

impl<A, D> DocumentGateway for PortalGateway<A, D>
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    fn list_documents(
        &self,
        application_id: &ApplicationId,
        application_type: ApplicationType,
    ) -> Result<Vec<DocumentSummary>, GatewayError> {
        Ok(self.service.list_documents(application_id, application_type)?)
    }

    fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt, GatewayError> {
        Ok(self.service.upload_document(upload)?)
    }
}

impl<A, D> ApplicationGateway for PortalGateway<A, D>
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    fn fetch_checklist(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ChecklistSnapshot, GatewayError> {
        let application = self.service.get(application_id)?;
        Ok(ChecklistSnapshot::from(&application))
    }

    fn persist_checklist(
        &self,
        application_id: &ApplicationId,
        checklist: &StatusChecklist,
        expected_version: Option<u64>,
    ) -> Result<ChecklistSnapshot, GatewayError> {
        let application =
            self.service
                .update_checklist(application_id, *checklist, expected_version)?;
        Ok(ChecklistSnapshot::from(&application))
    }
}

impl<A, D> ChecklistGenerator for PortalGateway<A, D>
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    fn generate_evaluation_checklist(
        &self,
        application_id: &ApplicationId,
        override_existing: bool,
    ) -> Result<GeneratedDocument, GatewayError> {
        Ok(self
            .service
            .generate_evaluation_checklist(application_id, override_existing)?)
    }
}
