use chrono::NaiveDate;
use dmw_portal::workflows::direct_hire::{
    ApplicationId, ApplicationRepository, ApplicationType, Currency, DirectHireApplication,
    DocumentId, DocumentKind, DocumentRecord, DocumentRepository, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, DirectHireApplication>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(
        &self,
        record: DirectHireApplication,
    ) -> Result<DirectHireApplication, RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_if_version(
        &self,
        record: DirectHireApplication,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let current = guard
            .get(&record.id)
            .map(|stored| stored.version)
            .ok_or(RepositoryError::NotFound)?;
        if current != expected_version {
            return Err(RepositoryError::VersionChanged { current });
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<DirectHireApplication>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentRepository {
    records: Arc<Mutex<Vec<DocumentRecord>>>,
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn list(
        &self,
        application_id: &ApplicationId,
        application_type: ApplicationType,
    ) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|record| {
                &record.application_id == application_id
                    && record.application_type == application_type
            })
            .cloned()
            .collect())
    }

    fn remove(&self, id: &DocumentId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        let before = guard.len();
        guard.retain(|record| &record.id != id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("in-memory store lock poisoned".to_string())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Currency::ALL.iter().map(|currency| currency.code()).collect();
        format!("unknown currency '{raw}' (expected one of {})", known.join(", "))
    })
}

/// `--document passport=./scans/passport.pdf`
pub(crate) fn parse_document_arg(raw: &str) -> Result<(DocumentKind, PathBuf), String> {
    let (key, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=PATH, got '{raw}'"))?;
    let kind = DocumentKind::parse(key.trim())
        .ok_or_else(|| format!("unknown document kind '{}'", key.trim()))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(format!("missing file path for '{}'", kind.key()));
    }
    Ok((kind, PathBuf::from(path)))
}
