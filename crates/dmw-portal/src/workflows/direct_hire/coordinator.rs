use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::checklist::{ChecklistError, ChecklistSession, Transition};
use super::documents::{
    Completion, DocumentError, DocumentKind, DocumentRequirement, DocumentTracker, UploadFile,
    UploadPolicy,
};
use super::domain::{ApplicationId, GeneratedDocument, Milestone, StatusChecklist};
use super::gateway::{GatewayError, Notification, NotificationLevel, PortalCollaborators};

/// What the caller should present after a milestone toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorStep {
    Updated(Transition),
    /// The document tracker is open; show it with the current required completion.
    DocumentsRequired(Completion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NoChanges,
    /// The draft checks milestones that cannot be undone; call `save(true)` to proceed.
    ConfirmationRequired(Vec<Milestone>),
    Saved(StatusChecklist),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    Generated(GeneratedDocument),
    /// A checklist document exists; retry with `override_existing = true` to replace it.
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Checklist(#[from] ChecklistError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("required documents incomplete ({0})")]
    DocumentsIncomplete(Completion),
    #[error("document requirements are not open")]
    TrackerClosed,
}

/// Drives one checklist editing session for a single application.
pub struct ChecklistCoordinator {
    application_id: ApplicationId,
    collaborators: PortalCollaborators,
    policy: UploadPolicy,
    session: ChecklistSession,
    version: u64,
    tracker: Option<DocumentTracker>,
    warned: bool,
}

impl ChecklistCoordinator {
    /// Loads the persisted checklist and starts a draft on top of it.
    pub fn open(
        application_id: ApplicationId,
        collaborators: PortalCollaborators,
        policy: UploadPolicy,
    ) -> Result<Self, CoordinatorError> {
        let snapshot = collaborators
            .applications
            .fetch_checklist(&application_id)
            .map_err(|err| {
                warn!(application_id = %application_id, error = %err, "unable to load checklist");
                collaborators.notifier.notify(Notification::new(
                    NotificationLevel::Error,
                    "Unable to load status",
                    err.to_string(),
                ));
                err
            })?;

        debug!(application_id = %application_id, version = snapshot.version, "checklist session opened");
        Ok(Self {
            application_id,
            collaborators,
            policy,
            session: ChecklistSession::new(snapshot.status_checklist),
            version: snapshot.version,
            tracker: None,
            warned: false,
        })
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn session(&self) -> &ChecklistSession {
        &self.session
    }

    pub fn draft(&self) -> &StatusChecklist {
        self.session.draft()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tracker(&self) -> Option<&DocumentTracker> {
        self.tracker.as_ref()
    }

    fn notify(&self, level: NotificationLevel, title: &str, message: impl Into<String>) {
        self.collaborators
            .notifier
            .notify(Notification::new(level, title, message));
    }

    pub fn toggle(
        &mut self,
        milestone: Milestone,
        checked: bool,
    ) -> Result<CoordinatorStep, CoordinatorError> {
        match self.session.set_milestone(milestone, checked, Utc::now()) {
            Ok(Transition::DocumentsRequired) => {
                let completion = self.open_tracker().completion();
                Ok(CoordinatorStep::DocumentsRequired(completion))
            }
            Ok(transition) => Ok(CoordinatorStep::Updated(transition)),
            Err(err) => {
                self.notify(NotificationLevel::Error, "Cannot uncheck status", err.to_string());
                Err(err.into())
            }
        }
    }

    fn open_tracker(&mut self) -> &DocumentTracker {
        let mut tracker = DocumentTracker::open(
            self.application_id.clone(),
            self.collaborators.documents.clone(),
            self.policy,
        );
        tracker.load_existing();
        self.tracker.insert(tracker)
    }

    fn tracker_mut(&mut self) -> Result<&mut DocumentTracker, CoordinatorError> {
        self.tracker.as_mut().ok_or(CoordinatorError::TrackerClosed)
    }

    pub fn select_document(
        &mut self,
        kind: DocumentKind,
        file: UploadFile,
    ) -> Result<(), CoordinatorError> {
        let result = self.tracker_mut()?.select_file(kind, file);
        if let Err(err) = &result {
            self.notify(NotificationLevel::Error, "Invalid file", err.to_string());
        }
        Ok(result?)
    }

    pub fn upload_document(
        &mut self,
        kind: DocumentKind,
        meta: Option<BTreeMap<String, String>>,
    ) -> Result<DocumentRequirement, CoordinatorError> {
        let result = self
            .tracker_mut()?
            .confirm_upload(kind, meta)
            .map(|entry| entry.clone());
        match &result {
            Ok(entry) => self.notify(
                NotificationLevel::Success,
                "Document uploaded",
                format!(
                    "{} uploaded successfully",
                    entry.file_name.as_deref().unwrap_or(kind.label())
                ),
            ),
            Err(err) => self.notify(NotificationLevel::Error, "Upload failed", err.to_string()),
        }
        Ok(result?)
    }

    pub fn toggle_document(
        &mut self,
        kind: DocumentKind,
        checked: bool,
    ) -> Result<(), CoordinatorError> {
        let result = self.tracker_mut()?.toggle_checked(kind, checked);
        if let Err(err) = &result {
            self.notify(NotificationLevel::Error, "Document required", err.to_string());
        }
        Ok(result?)
    }

    /// Applies `evaluated` once every required document is present and closes the tracker.
    pub fn finish_documents(&mut self) -> Result<Transition, CoordinatorError> {
        let tracker = self.tracker.as_ref().ok_or(CoordinatorError::TrackerClosed)?;
        let Some(proof) = tracker.requirements_satisfied() else {
            let completion = tracker.completion();
            self.notify(
                NotificationLevel::Warning,
                "Documents incomplete",
                format!(
                    "{} of {} required documents attached",
                    completion.completed, completion.total
                ),
            );
            return Err(CoordinatorError::DocumentsIncomplete(completion));
        };

        let transition = self.session.complete_evaluation(proof, Utc::now());
        self.tracker = None;
        info!(application_id = %self.application_id, "document requirements complete; evaluated staged");
        Ok(transition)
    }

    /// Closes the tracker without touching the draft.
    pub fn cancel_documents(&mut self) {
        self.tracker = None;
    }

    /// Requests the evaluation checklist document. A conflict means one already exists.
    pub fn generate_checklist_document(
        &mut self,
        override_existing: bool,
    ) -> Result<GenerateOutcome, CoordinatorError> {
        let completion = match &self.tracker {
            Some(tracker) => tracker.completion(),
            None => {
                let mut tracker = DocumentTracker::open(
                    self.application_id.clone(),
                    self.collaborators.documents.clone(),
                    self.policy,
                );
                tracker.load_existing();
                tracker.completion()
            }
        };
        if !completion.is_complete() {
            return Err(CoordinatorError::DocumentsIncomplete(completion));
        }

        match self
            .collaborators
            .generator
            .generate_evaluation_checklist(&self.application_id, override_existing)
        {
            Ok(document) => {
                self.notify(
                    NotificationLevel::Success,
                    "Checklist generated",
                    format!("{} attached to the application", document.file_name),
                );
                Ok(GenerateOutcome::Generated(document))
            }
            Err(GatewayError::Conflict(_)) if !override_existing => {
                self.notify(
                    NotificationLevel::Warning,
                    "Checklist already exists",
                    "An evaluation checklist is already attached. Confirm to regenerate it.",
                );
                Ok(GenerateOutcome::AlreadyExists)
            }
            Err(err) => {
                self.notify(NotificationLevel::Error, "Checklist generation failed", err.to_string());
                Err(err.into())
            }
        }
    }

    /// Persists the draft. Newly checked milestones need `confirmed` because they
    /// cannot be unchecked once saved.
    pub fn save(&mut self, confirmed: bool) -> Result<SaveOutcome, CoordinatorError> {
        if !self.session.has_changes() {
            return Ok(SaveOutcome::NoChanges);
        }

        let pending = self.session.pending_transitions();
        if !pending.is_empty() && !confirmed {
            if !self.warned {
                let labels: Vec<&str> = pending.iter().map(|milestone| milestone.label()).collect();
                self.notify(
                    NotificationLevel::Warning,
                    "This action cannot be undone",
                    format!(
                        "Saving will permanently mark {} as done.",
                        labels.join(", ")
                    ),
                );
                self.warned = true;
            }
            return Ok(SaveOutcome::ConfirmationRequired(pending));
        }

        match self.collaborators.applications.persist_checklist(
            &self.application_id,
            self.session.draft(),
            Some(self.version),
        ) {
            Ok(snapshot) => {
                self.session.commit(snapshot.status_checklist);
                self.version = snapshot.version;
                self.warned = false;
                info!(
                    application_id = %self.application_id,
                    version = self.version,
                    "checklist saved"
                );
                self.notify(
                    NotificationLevel::Success,
                    "Status updated",
                    "Application status checklist saved.",
                );
                Ok(SaveOutcome::Saved(snapshot.status_checklist))
            }
            Err(err) => {
                warn!(application_id = %self.application_id, error = %err, "checklist save failed");
                self.notify(NotificationLevel::Error, "Failed to update status", err.to_string());
                Err(err.into())
            }
        }
    }
}
