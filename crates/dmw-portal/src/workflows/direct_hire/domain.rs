use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::salary::MonetaryAmount;

/// Identifier wrapper for Direct Hire applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminator attached to every document call so storage can be shared across
/// application kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    DirectHire,
}

impl ApplicationType {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationType::DirectHire => "direct_hire",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "direct_hire" => Some(Self::DirectHire),
            _ => None,
        }
    }
}

/// The five status milestones staff progress a Direct Hire application through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Evaluated,
    ForConfirmation,
    EmailedToDhad,
    ReceivedFromDhad,
    ForInterview,
}

impl Milestone {
    /// Display order; `ForInterview` is the conventional last step.
    pub const ALL: [Milestone; 5] = [
        Milestone::Evaluated,
        Milestone::ForConfirmation,
        Milestone::EmailedToDhad,
        Milestone::ReceivedFromDhad,
        Milestone::ForInterview,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Milestone::Evaluated => "evaluated",
            Milestone::ForConfirmation => "for_confirmation",
            Milestone::EmailedToDhad => "emailed_to_dhad",
            Milestone::ReceivedFromDhad => "received_from_dhad",
            Milestone::ForInterview => "for_interview",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Milestone::Evaluated => "Evaluated",
            Milestone::ForConfirmation => "For Confirmation",
            Milestone::EmailedToDhad => "Emailed to DHAD",
            Milestone::ReceivedFromDhad => "Received from DHAD",
            Milestone::ForInterview => "For Interview",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|milestone| milestone.key() == value.trim())
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEntry {
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MilestoneEntry {
    pub fn checked_at(at: DateTime<Utc>) -> Self {
        Self {
            checked: true,
            timestamp: Some(at),
        }
    }
}

/// Per-application milestone flags, serialized as the `status_checklist` object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChecklist {
    #[serde(default)]
    pub evaluated: MilestoneEntry,
    #[serde(default)]
    pub for_confirmation: MilestoneEntry,
    #[serde(default)]
    pub emailed_to_dhad: MilestoneEntry,
    #[serde(default)]
    pub received_from_dhad: MilestoneEntry,
    #[serde(default)]
    pub for_interview: MilestoneEntry,
}

impl StatusChecklist {
    pub fn entry(&self, milestone: Milestone) -> &MilestoneEntry {
        match milestone {
            Milestone::Evaluated => &self.evaluated,
            Milestone::ForConfirmation => &self.for_confirmation,
            Milestone::EmailedToDhad => &self.emailed_to_dhad,
            Milestone::ReceivedFromDhad => &self.received_from_dhad,
            Milestone::ForInterview => &self.for_interview,
        }
    }

    pub fn entry_mut(&mut self, milestone: Milestone) -> &mut MilestoneEntry {
        match milestone {
            Milestone::Evaluated => &mut self.evaluated,
            Milestone::ForConfirmation => &mut self.for_confirmation,
            Milestone::EmailedToDhad => &mut self.emailed_to_dhad,
            Milestone::ReceivedFromDhad => &mut self.received_from_dhad,
            Milestone::ForInterview => &mut self.for_interview,
        }
    }

    pub fn is_checked(&self, milestone: Milestone) -> bool {
        self.entry(milestone).checked
    }

    pub fn iter(&self) -> impl Iterator<Item = (Milestone, &MilestoneEntry)> + '_ {
        Milestone::ALL
            .into_iter()
            .map(move |milestone| (milestone, self.entry(milestone)))
    }

    /// Furthest checked milestone in display order, used as the headline status.
    pub fn current_status(&self) -> Option<Milestone> {
        Milestone::ALL
            .into_iter()
            .rev()
            .find(|milestone| self.is_checked(*milestone))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Intake payload captured by the Direct Hire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectHireSubmission {
    pub name: String,
    pub sex: Sex,
    pub position: String,
    pub job_site: String,
    pub employer: String,
    pub salary: MonetaryAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("salary must be a positive amount")]
    InvalidSalary,
}

impl DirectHireSubmission {
    pub fn validate(&self) -> Result<(), SubmissionError> {
        let required = [
            ("name", &self.name),
            ("position", &self.position),
            ("job_site", &self.job_site),
            ("employer", &self.employer),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SubmissionError::MissingField(field));
            }
        }
        if !self.salary.amount.is_finite() || self.salary.amount <= 0.0 {
            return Err(SubmissionError::InvalidSalary);
        }
        Ok(())
    }
}

/// Repository record for a Direct Hire application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectHireApplication {
    pub id: ApplicationId,
    pub control_number: String,
    pub name: String,
    pub sex: Sex,
    pub position: String,
    pub job_site: String,
    pub employer: String,
    pub salary: MonetaryAmount,
    pub status_checklist: StatusChecklist,
    /// Bumped on every write; callers may echo it back to detect lost updates.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DirectHireApplication {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Stored document as listed by `GET /api/documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub document_type: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// Identifier and stored name returned after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: DocumentId,
    pub file_name: String,
}

/// Derived evaluation checklist attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub id: DocumentId,
    pub file_name: String,
    pub regenerated: bool,
}

/// Checklist plus the version it was read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSnapshot {
    pub status_checklist: StatusChecklist,
    pub version: u64,
}

impl From<&DirectHireApplication> for ChecklistSnapshot {
    fn from(application: &DirectHireApplication) -> Self {
        Self {
            status_checklist: application.status_checklist,
            version: application.version,
        }
    }
}
