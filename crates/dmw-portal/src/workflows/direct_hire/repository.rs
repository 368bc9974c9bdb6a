use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationId, ApplicationType, DirectHireApplication, DocumentId, DocumentSummary,
};

/// Stored file plus the metadata captured at upload time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub application_id: ApplicationId,
    pub application_type: ApplicationType,
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub meta: BTreeMap<String, String>,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            document_type: self.document_type.clone(),
            file_name: self.file_name.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// Storage abstraction for Direct Hire applications.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: DirectHireApplication)
        -> Result<DirectHireApplication, RepositoryError>;
    /// Replace the stored record only while its version still equals
    /// `expected_version`. The comparison and the write happen under one lock
    /// (or one conditional statement) so concurrent writers cannot both land.
    fn update_if_version(
        &self,
        record: DirectHireApplication,
        expected_version: u64,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<DirectHireApplication>, RepositoryError>;
}

/// Storage abstraction for uploaded and generated documents.
pub trait DocumentRepository: Send + Sync {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError>;
    fn list(
        &self,
        application_id: &ApplicationId,
        application_type: ApplicationType,
    ) -> Result<Vec<DocumentRecord>, RepositoryError>;
    fn remove(&self, id: &DocumentId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read (now version {current})")]
    VersionChanged { current: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
