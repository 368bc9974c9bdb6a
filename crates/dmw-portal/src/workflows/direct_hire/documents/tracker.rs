use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::{DocumentKind, OPTIONAL_TOTAL, REQUIRED_TOTAL};
use super::upload::{
    validate_metadata, DocumentUpload, FileValidationError, MetadataError, UploadFile,
    UploadPolicy,
};
use crate::workflows::direct_hire::domain::{ApplicationId, ApplicationType, DocumentId};
use crate::workflows::direct_hire::gateway::{DocumentGateway, GatewayError};

/// One catalog entry and its attachment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRequirement {
    pub key: DocumentKind,
    pub label: &'static str,
    pub required: bool,
    pub checked: bool,
    pub file_name: Option<String>,
    pub file_id: Option<DocumentId>,
    #[serde(skip)]
    pub staged: Option<UploadFile>,
    pub meta: BTreeMap<String, String>,
}

impl DocumentRequirement {
    fn empty(kind: DocumentKind) -> Self {
        Self {
            key: kind,
            label: kind.label(),
            required: kind.required(),
            checked: false,
            file_name: None,
            file_id: None,
            staged: None,
            meta: BTreeMap::new(),
        }
    }

    pub fn has_file(&self) -> bool {
        self.file_id.is_some() || self.staged.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub completed: usize,
    pub total: usize,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

impl std::fmt::Display for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Proof that every required document is attached and checked.
///
/// Only the tracker hands these out; the checklist consumes one to mark the
/// application evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequirementsSatisfied {
    completion: Completion,
}

impl RequirementsSatisfied {
    pub(crate) fn from_completion(completion: Completion) -> Option<Self> {
        completion
            .is_complete()
            .then_some(Self { completion })
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    InvalidFile(#[from] FileValidationError),
    #[error(transparent)]
    InvalidMetadata(#[from] MetadataError),
    #[error("document required: attach a file for {0} before marking it complete")]
    DocumentRequired(DocumentKind),
    #[error("no file selected for {0}")]
    NothingStaged(DocumentKind),
    #[error("upload failed for {kind}: {source}")]
    Upload {
        kind: DocumentKind,
        #[source]
        source: GatewayError,
    },
}

/// Tracks the supporting-document checklist for a single application.
pub struct DocumentTracker {
    application_id: ApplicationId,
    gateway: Arc<dyn DocumentGateway>,
    policy: UploadPolicy,
    entries: Vec<DocumentRequirement>,
}

impl std::fmt::Debug for DocumentTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTracker")
            .field("application_id", &self.application_id)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl DocumentTracker {
    /// Opens an empty tracker bound to `application_id`; call [`Self::load_existing`] to hydrate it.
    pub fn open(
        application_id: ApplicationId,
        gateway: Arc<dyn DocumentGateway>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            application_id,
            gateway,
            policy,
            entries: DocumentKind::ALL
                .into_iter()
                .map(DocumentRequirement::empty)
                .collect(),
        }
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn entries(&self) -> &[DocumentRequirement] {
        &self.entries
    }

    pub fn entry(&self, kind: DocumentKind) -> &DocumentRequirement {
        self.entries
            .iter()
            .find(|entry| entry.key == kind)
            .unwrap_or_else(|| unreachable!("catalog contains every document kind"))
    }

    fn entry_mut(&mut self, kind: DocumentKind) -> &mut DocumentRequirement {
        self.entries
            .iter_mut()
            .find(|entry| entry.key == kind)
            .unwrap_or_else(|| unreachable!("catalog contains every document kind"))
    }

    /// Re-derives attachment state from stored documents. A failed fetch leaves
    /// every entry unchecked instead of surfacing an error.
    pub fn load_existing(&mut self) {
        self.entries = DocumentKind::ALL
            .into_iter()
            .map(DocumentRequirement::empty)
            .collect();

        let documents = match self
            .gateway
            .list_documents(&self.application_id, ApplicationType::DirectHire)
        {
            Ok(documents) => documents,
            Err(err) => {
                warn!(
                    application_id = %self.application_id,
                    error = %err,
                    "document lookup failed; starting from an empty checklist"
                );
                return;
            }
        };

        for entry in &mut self.entries {
            if let Some(document) = documents
                .iter()
                .find(|document| document.document_type == entry.key.key())
            {
                entry.checked = true;
                entry.file_name = Some(document.file_name.clone());
                entry.file_id = Some(document.id.clone());
                entry.meta = document.meta.clone();
            }
        }

        debug!(
            application_id = %self.application_id,
            completed = self.completion().completed,
            "loaded existing documents"
        );
    }

    /// Validates and stages a file for `kind` without uploading it.
    pub fn select_file(&mut self, kind: DocumentKind, file: UploadFile) -> Result<(), DocumentError> {
        self.policy.validate(&file)?;
        self.entry_mut(kind).staged = Some(file);
        Ok(())
    }

    /// Uploads the staged file for `kind`, tagging it with the document key.
    pub fn confirm_upload(
        &mut self,
        kind: DocumentKind,
        meta: Option<BTreeMap<String, String>>,
    ) -> Result<&DocumentRequirement, DocumentError> {
        if let Some(meta) = &meta {
            validate_metadata(kind, meta)?;
        }
        let file = self
            .entry(kind)
            .staged
            .clone()
            .ok_or(DocumentError::NothingStaged(kind))?;

        let upload = DocumentUpload {
            application_id: self.application_id.clone(),
            application_type: ApplicationType::DirectHire,
            document_name: kind.key().to_string(),
            file,
            meta: meta.clone(),
        };

        let receipt = self
            .gateway
            .upload_document(upload)
            .map_err(|source| DocumentError::Upload { kind, source })?;

        info!(
            application_id = %self.application_id,
            document = %kind,
            file_id = %receipt.id,
            "document uploaded"
        );

        let entry = self.entry_mut(kind);
        entry.checked = true;
        entry.staged = None;
        entry.file_name = Some(receipt.file_name);
        entry.file_id = Some(receipt.id);
        entry.meta = meta.unwrap_or_default();
        Ok(entry)
    }

    /// Stages and uploads in one step.
    pub fn upload(
        &mut self,
        kind: DocumentKind,
        file: UploadFile,
        meta: Option<BTreeMap<String, String>>,
    ) -> Result<&DocumentRequirement, DocumentError> {
        self.select_file(kind, file)?;
        self.confirm_upload(kind, meta)
    }

    pub fn toggle_checked(&mut self, kind: DocumentKind, checked: bool) -> Result<(), DocumentError> {
        let entry = self.entry_mut(kind);
        if checked && !entry.has_file() {
            return Err(DocumentError::DocumentRequired(kind));
        }
        entry.checked = checked;
        Ok(())
    }

    /// Checked required entries over the fixed required total.
    pub fn completion(&self) -> Completion {
        Completion {
            completed: self.count_checked(true),
            total: REQUIRED_TOTAL,
        }
    }

    pub fn optional_completion(&self) -> Completion {
        Completion {
            completed: self.count_checked(false),
            total: OPTIONAL_TOTAL,
        }
    }

    fn count_checked(&self, required: bool) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.required == required && entry.checked)
            .count()
    }

    pub fn requirements_satisfied(&self) -> Option<RequirementsSatisfied> {
        RequirementsSatisfied::from_completion(self.completion())
    }

    /// Required kinds still missing, in catalog order.
    pub fn missing_required(&self) -> Vec<DocumentKind> {
        self.entries
            .iter()
            .filter(|entry| entry.required && !entry.checked)
            .map(|entry| entry.key)
            .collect()
    }
}
