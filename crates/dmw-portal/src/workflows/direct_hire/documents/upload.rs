use std::collections::BTreeMap;

use mime::Mime;

use super::catalog::DocumentKind;
use crate::config::DocumentPolicyConfig;
use crate::workflows::direct_hire::domain::{ApplicationId, ApplicationType};

/// File picked by staff, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: Mime, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Request forwarded to the document upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub application_id: ApplicationId,
    pub application_type: ApplicationType,
    pub document_name: String,
    pub file: UploadFile,
    pub meta: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileValidationError {
    #[error("unsupported file format '{found}': only JPEG, PNG, and PDF files are accepted")]
    UnsupportedFormat { found: String },
    #[error("file is {size} bytes; the maximum allowed size is {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("file is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("{kind} does not accept metadata field '{field}'")]
    UnexpectedField { kind: DocumentKind, field: String },
    #[error("{kind} metadata field '{field}' must not be blank")]
    BlankField { kind: DocumentKind, field: String },
}

/// Format and size rules shared by the tracker and the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from(&DocumentPolicyConfig::default())
    }
}

impl From<&DocumentPolicyConfig> for UploadPolicy {
    fn from(config: &DocumentPolicyConfig) -> Self {
        Self {
            max_bytes: config.max_upload_bytes,
        }
    }
}

impl UploadPolicy {
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn is_accepted_type(content_type: &Mime) -> bool {
        let essence = content_type.essence_str();
        [mime::IMAGE_JPEG, mime::IMAGE_PNG, mime::APPLICATION_PDF]
            .iter()
            .any(|accepted| accepted.essence_str() == essence)
    }

    pub fn validate(&self, file: &UploadFile) -> Result<(), FileValidationError> {
        if !Self::is_accepted_type(&file.content_type) {
            return Err(FileValidationError::UnsupportedFormat {
                found: file.content_type.essence_str().to_string(),
            });
        }
        if file.size() > self.max_bytes {
            return Err(FileValidationError::TooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }
        if file.bytes.is_empty() {
            return Err(FileValidationError::Empty);
        }
        Ok(())
    }
}

pub fn validate_metadata(
    kind: DocumentKind,
    meta: &BTreeMap<String, String>,
) -> Result<(), MetadataError> {
    for (field, value) in meta {
        if !kind.meta_fields().contains(&field.as_str()) {
            return Err(MetadataError::UnexpectedField {
                kind,
                field: field.clone(),
            });
        }
        if value.trim().is_empty() {
            return Err(MetadataError::BlankField {
                kind,
                field: field.clone(),
            });
        }
    }
    Ok(())
}
