use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::checklist::{ensure_no_uncheck, ChecklistError};
use super::control_number::ControlNumberGenerator;
use super::documents::{
    validate_metadata, DocumentKind, DocumentUpload, FileValidationError, MetadataError,
    UploadPolicy,
};
use super::domain::{
    ApplicationId, ApplicationType, DirectHireApplication, DirectHireSubmission, DocumentId,
    DocumentSummary, GeneratedDocument, MilestoneEntry, StatusChecklist, SubmissionError,
    UploadReceipt,
};
use super::repository::{
    ApplicationRepository, DocumentRecord, DocumentRepository, RepositoryError,
};

/// Document type under which the generated evaluation checklist is stored.
pub const EVALUATION_CHECKLIST_TYPE: &str = "evaluation_checklist";

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("dh-{id:06}"))
}

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

/// Server side of the Direct Hire endpoints: applications, checklist writes,
/// document storage, and evaluation checklist generation.
pub struct DirectHireService<A, D> {
    applications: Arc<A>,
    documents: Arc<D>,
    control_numbers: ControlNumberGenerator,
    policy: UploadPolicy,
}

impl<A, D> DirectHireService<A, D>
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    /// Control numbering starts at 001; use `with_control_numbers` to continue
    /// a sequence issued by an earlier process.
    pub fn new(applications: Arc<A>, documents: Arc<D>, policy: UploadPolicy) -> Self {
        Self::with_control_numbers(applications, documents, policy, ControlNumberGenerator::new())
    }

    pub fn with_control_numbers(
        applications: Arc<A>,
        documents: Arc<D>,
        policy: UploadPolicy,
        control_numbers: ControlNumberGenerator,
    ) -> Self {
        Self {
            applications,
            documents,
            control_numbers,
            policy,
        }
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    /// Register a new application with every milestone unchecked.
    pub fn create(
        &self,
        submission: DirectHireSubmission,
    ) -> Result<DirectHireApplication, PortalServiceError> {
        self.create_at(submission, Utc::now())
    }

    pub fn create_at(
        &self,
        submission: DirectHireSubmission,
        now: DateTime<Utc>,
    ) -> Result<DirectHireApplication, PortalServiceError> {
        submission.validate()?;

        let DirectHireSubmission {
            name,
            sex,
            position,
            job_site,
            employer,
            salary,
        } = submission;

        let record = DirectHireApplication {
            id: next_application_id(),
            control_number: self.control_numbers.next(now.date_naive()),
            name: name.trim().to_string(),
            sex,
            position: position.trim().to_string(),
            job_site: job_site.trim().to_string(),
            employer: employer.trim().to_string(),
            salary,
            status_checklist: StatusChecklist::default(),
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let stored = self.applications.insert(record)?;
        info!(
            application_id = %stored.id,
            control_number = %stored.control_number,
            "direct hire application created"
        );
        Ok(stored)
    }

    /// Fetch a live (not soft-deleted) application.
    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<DirectHireApplication, PortalServiceError> {
        let record = self
            .applications
            .fetch(application_id)?
            .filter(|record| !record.is_deleted())
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Persist a checklist snapshot, refusing to uncheck stored milestones and,
    /// when `expected_version` is given, refusing stale writes.
    pub fn update_checklist(
        &self,
        application_id: &ApplicationId,
        checklist: StatusChecklist,
        expected_version: Option<u64>,
    ) -> Result<DirectHireApplication, PortalServiceError> {
        let mut record = self.get(application_id)?;

        if let Some(expected) = expected_version {
            if expected != record.version {
                warn!(
                    application_id = %application_id,
                    expected,
                    current = record.version,
                    "rejecting stale checklist write"
                );
                return Err(PortalServiceError::StaleVersion {
                    expected,
                    current: record.version,
                });
            }
        }

        ensure_no_uncheck(&record.status_checklist, &checklist)?;

        let now = Utc::now();
        let mut next = checklist;
        for (milestone, previous) in record.status_checklist.iter() {
            let entry = next.entry_mut(milestone);
            if previous.checked {
                // Stored timestamps win over whatever the client echoes back.
                *entry = *previous;
            } else if entry.checked && entry.timestamp.is_none() {
                *entry = MilestoneEntry::checked_at(now);
            } else if !entry.checked {
                entry.timestamp = None;
            }
        }

        let read_version = record.version;
        record.status_checklist = next;
        record.version = read_version + 1;
        record.updated_at = now;
        // The uncheck guard above only holds if nobody wrote in between.
        match self
            .applications
            .update_if_version(record.clone(), read_version)
        {
            Ok(()) => {}
            Err(RepositoryError::VersionChanged { current }) => {
                warn!(
                    application_id = %application_id,
                    expected = read_version,
                    current,
                    "concurrent checklist write rejected"
                );
                return Err(PortalServiceError::StaleVersion {
                    expected: expected_version.unwrap_or(read_version),
                    current,
                });
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            application_id = %application_id,
            version = record.version,
            status = record
                .status_checklist
                .current_status()
                .map(|milestone| milestone.key())
                .unwrap_or("pending"),
            "status checklist saved"
        );
        Ok(record)
    }

    pub fn soft_delete(&self, application_id: &ApplicationId) -> Result<(), PortalServiceError> {
        let mut record = self.get(application_id)?;
        let now = Utc::now();
        let read_version = record.version;
        record.deleted_at = Some(now);
        record.version = read_version + 1;
        record.updated_at = now;
        self.applications
            .update_if_version(record, read_version)
            .map_err(|err| match err {
                RepositoryError::VersionChanged { current } => PortalServiceError::StaleVersion {
                    expected: read_version,
                    current,
                },
                other => other.into(),
            })?;
        info!(application_id = %application_id, "direct hire application deleted");
        Ok(())
    }

    pub fn list_documents(
        &self,
        application_id: &ApplicationId,
        application_type: ApplicationType,
    ) -> Result<Vec<DocumentSummary>, PortalServiceError> {
        let records = self.documents.list(application_id, application_type)?;
        Ok(records.iter().map(DocumentRecord::summary).collect())
    }

    /// Store an uploaded document, replacing any earlier file of the same type.
    pub fn upload_document(
        &self,
        upload: DocumentUpload,
    ) -> Result<UploadReceipt, PortalServiceError> {
        let DocumentUpload {
            application_id,
            application_type,
            document_name,
            file,
            meta,
        } = upload;

        let kind = DocumentKind::parse(&document_name)
            .ok_or_else(|| PortalServiceError::UnknownDocumentType(document_name.clone()))?;
        self.policy.validate(&file)?;
        let meta = meta.unwrap_or_default();
        validate_metadata(kind, &meta)?;
        self.get(&application_id)?;

        self.remove_documents_of_type(&application_id, application_type, kind.key())?;

        let record = DocumentRecord {
            id: next_document_id(),
            application_id: application_id.clone(),
            application_type,
            document_type: kind.key().to_string(),
            file_name: file.file_name,
            content_type: file.content_type.essence_str().to_string(),
            content: file.bytes,
            meta,
            uploaded_at: Utc::now(),
        };
        let stored = self.documents.insert(record)?;

        info!(
            application_id = %application_id,
            document = %kind,
            document_id = %stored.id,
            "document stored"
        );
        Ok(UploadReceipt {
            id: stored.id,
            file_name: stored.file_name,
        })
    }

    /// Render the evaluation checklist and attach it to the application.
    pub fn generate_evaluation_checklist(
        &self,
        application_id: &ApplicationId,
        override_existing: bool,
    ) -> Result<GeneratedDocument, PortalServiceError> {
        let application = self.get(application_id)?;
        let documents = self
            .documents
            .list(application_id, ApplicationType::DirectHire)?;

        let missing: Vec<DocumentKind> = DocumentKind::required_kinds()
            .filter(|kind| {
                !documents
                    .iter()
                    .any(|document| document.document_type == kind.key())
            })
            .collect();
        if !missing.is_empty() {
            return Err(PortalServiceError::MissingRequiredDocuments(missing));
        }

        let existing = documents
            .iter()
            .any(|document| document.document_type == EVALUATION_CHECKLIST_TYPE);
        if existing && !override_existing {
            return Err(PortalServiceError::ChecklistDocumentExists);
        }
        if existing {
            self.remove_documents_of_type(
                application_id,
                ApplicationType::DirectHire,
                EVALUATION_CHECKLIST_TYPE,
            )?;
        }

        let now = Utc::now();
        let record = DocumentRecord {
            id: next_document_id(),
            application_id: application_id.clone(),
            application_type: ApplicationType::DirectHire,
            document_type: EVALUATION_CHECKLIST_TYPE.to_string(),
            file_name: format!("{}-evaluation-checklist.txt", application.control_number),
            content_type: mime::TEXT_PLAIN_UTF_8.to_string(),
            content: render_evaluation_checklist(&application, &documents, now).into_bytes(),
            meta: Default::default(),
            uploaded_at: now,
        };
        let stored = self.documents.insert(record)?;

        info!(
            application_id = %application_id,
            document_id = %stored.id,
            regenerated = existing,
            "evaluation checklist generated"
        );
        Ok(GeneratedDocument {
            id: stored.id,
            file_name: stored.file_name,
            regenerated: existing,
        })
    }

    fn remove_documents_of_type(
        &self,
        application_id: &ApplicationId,
        application_type: ApplicationType,
        document_type: &str,
    ) -> Result<(), PortalServiceError> {
        for previous in self
            .documents
            .list(application_id, application_type)?
            .into_iter()
            .filter(|document| document.document_type == document_type)
        {
            self.documents.remove(&previous.id)?;
        }
        Ok(())
    }
}

fn render_evaluation_checklist(
    application: &DirectHireApplication,
    documents: &[DocumentRecord],
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DIRECT HIRE EVALUATION CHECKLIST");
    let _ = writeln!(out, "Control No.: {}", application.control_number);
    let _ = writeln!(out, "Worker: {}", application.name);
    let _ = writeln!(out, "Position: {}", application.position);
    let _ = writeln!(out, "Employer: {}", application.employer);
    let _ = writeln!(out, "Job site: {}", application.job_site);
    let _ = writeln!(out, "Salary: {}", application.salary);
    let _ = writeln!(out);

    for kind in DocumentKind::ALL {
        let document = documents
            .iter()
            .find(|document| document.document_type == kind.key());
        let mark = if document.is_some() { "x" } else { " " };
        let tag = if kind.required() { "required" } else { "optional" };
        let _ = write!(out, "[{mark}] {} ({tag})", kind.label());
        if let Some(document) = document {
            let _ = write!(out, " - {}", document.file_name);
            for (field, value) in &document.meta {
                let _ = write!(out, "; {field}: {value}");
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Generated: {}", generated_at.to_rfc3339());
    out
}

/// Error raised by the Direct Hire service.
#[derive(Debug, thiserror::Error)]
pub enum PortalServiceError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    File(#[from] FileValidationError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("unknown document type '{0}'")]
    UnknownDocumentType(String),
    #[error(transparent)]
    Checklist(#[from] ChecklistError),
    #[error("checklist was modified by someone else (expected version {expected}, current {current})")]
    StaleVersion { expected: u64, current: u64 },
    #[error("required documents missing: {}", format_kinds(.0))]
    MissingRequiredDocuments(Vec<DocumentKind>),
    #[error("an evaluation checklist already exists; request an override to regenerate it")]
    ChecklistDocumentExists,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn format_kinds(kinds: &[DocumentKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.key())
        .collect::<Vec<_>>()
        .join(", ")
}
