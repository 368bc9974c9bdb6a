use std::fmt;

use serde::{Deserialize, Serialize};

/// Supporting documents collected for a Direct Hire evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Passport,
    WorkVisa,
    EmploymentContract,
    TesdaLicense,
    CountrySpecific,
    ComplianceForm,
    MedicalCertificate,
    PeosCertificate,
    Clearance,
    InsuranceCoverage,
    ERegistration,
    PdosCertificate,
}

pub const REQUIRED_TOTAL: usize = 4;
pub const OPTIONAL_TOTAL: usize = 8;

impl DocumentKind {
    /// Catalog order: required documents first.
    pub const ALL: [DocumentKind; REQUIRED_TOTAL + OPTIONAL_TOTAL] = [
        DocumentKind::Passport,
        DocumentKind::WorkVisa,
        DocumentKind::EmploymentContract,
        DocumentKind::TesdaLicense,
        DocumentKind::CountrySpecific,
        DocumentKind::ComplianceForm,
        DocumentKind::MedicalCertificate,
        DocumentKind::PeosCertificate,
        DocumentKind::Clearance,
        DocumentKind::InsuranceCoverage,
        DocumentKind::ERegistration,
        DocumentKind::PdosCertificate,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            DocumentKind::Passport => "passport",
            DocumentKind::WorkVisa => "work_visa",
            DocumentKind::EmploymentContract => "employment_contract",
            DocumentKind::TesdaLicense => "tesda_license",
            DocumentKind::CountrySpecific => "country_specific",
            DocumentKind::ComplianceForm => "compliance_form",
            DocumentKind::MedicalCertificate => "medical_certificate",
            DocumentKind::PeosCertificate => "peos_certificate",
            DocumentKind::Clearance => "clearance",
            DocumentKind::InsuranceCoverage => "insurance_coverage",
            DocumentKind::ERegistration => "e_registration",
            DocumentKind::PdosCertificate => "pdos_certificate",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Passport => "Passport (valid for at least 1 year)",
            DocumentKind::WorkVisa => "Valid Work Visa, Entry/Work Permit",
            DocumentKind::EmploymentContract => "Employment Contract or Offer of Employment",
            DocumentKind::TesdaLicense => "TESDA NC/PRC License",
            DocumentKind::CountrySpecific => "Country-Specific Requirements",
            DocumentKind::ComplianceForm => "Compliance Form",
            DocumentKind::MedicalCertificate => "Medical Certificate",
            DocumentKind::PeosCertificate => "PEOS Certificate",
            DocumentKind::Clearance => "Clearance",
            DocumentKind::InsuranceCoverage => "Proof of Insurance Coverage",
            DocumentKind::ERegistration => "E-Registration",
            DocumentKind::PdosCertificate => "PDOS Certificate",
        }
    }

    pub const fn required(self) -> bool {
        matches!(
            self,
            DocumentKind::Passport
                | DocumentKind::WorkVisa
                | DocumentKind::EmploymentContract
                | DocumentKind::TesdaLicense
        )
    }

    /// Structured fields staff may record alongside the file.
    pub const fn meta_fields(self) -> &'static [&'static str] {
        match self {
            DocumentKind::Passport => &["passport_number", "passport_expiry"],
            DocumentKind::WorkVisa => &["visa_type", "visa_number", "visa_validity"],
            DocumentKind::EmploymentContract => &["verification_method", "verification_date"],
            _ => &[],
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn required_kinds() -> impl Iterator<Item = DocumentKind> {
        Self::ALL.into_iter().filter(|kind| kind.required())
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
