//! Direct Hire application processing: status checklist, supporting documents,
//! and the endpoints backing them.

pub mod checklist;
pub mod control_number;
pub mod coordinator;
pub mod documents;
pub mod domain;
pub mod gateway;
pub mod repository;
pub mod router;
pub mod salary;
pub mod service;

#[cfg(test)]
mod tests;

pub use checklist::{ensure_no_uncheck, ChecklistError, ChecklistSession, Transition};
pub use control_number::ControlNumberGenerator;
pub use coordinator::{
    ChecklistCoordinator, CoordinatorError, CoordinatorStep, GenerateOutcome, SaveOutcome,
};
pub use documents::{
    Completion, DocumentError, DocumentKind, DocumentRequirement, DocumentTracker,
    DocumentUpload, FileValidationError, RequirementsSatisfied, UploadFile, UploadPolicy,
};
pub use domain::{
    ApplicationId, ApplicationType, ChecklistSnapshot, DirectHireApplication,
    DirectHireSubmission, DocumentId, DocumentSummary, GeneratedDocument, Milestone,
    MilestoneEntry, Sex, StatusChecklist, SubmissionError, UploadReceipt,
};
pub use gateway::{
    ApplicationGateway, ChecklistGenerator, DocumentGateway, GatewayError, Notification,
    NotificationLevel, Notifier, PortalCollaborators, PortalGateway,
};
pub use repository::{ApplicationRepository, DocumentRecord, DocumentRepository, RepositoryError};
pub use router::portal_router;
pub use salary::{Currency, ExchangeRates, MonetaryAmount, SalaryError};
pub use service::{DirectHireService, PortalServiceError, EVALUATION_CHECKLIST_TYPE};
