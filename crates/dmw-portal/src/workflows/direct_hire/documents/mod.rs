//! Supporting-document catalog, upload validation, and the requirement tracker.

pub mod catalog;
pub mod tracker;
pub mod upload;

pub use catalog::{DocumentKind, OPTIONAL_TOTAL, REQUIRED_TOTAL};
pub use tracker::{
    Completion, DocumentError, DocumentRequirement, DocumentTracker, RequirementsSatisfied,
};
pub use upload::{
    validate_metadata, DocumentUpload, FileValidationError, MetadataError, UploadFile,
    UploadPolicy,
};
