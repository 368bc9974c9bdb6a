use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::documents::{DocumentUpload, UploadFile};
use super::domain::{ApplicationId, ApplicationType, DirectHireSubmission, StatusChecklist};
use super::repository::{ApplicationRepository, DocumentRepository, RepositoryError};
use super::service::{DirectHireService, PortalServiceError};

/// Headroom for multipart framing and the text fields around the file part.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Router builder exposing the Direct Hire and document endpoints.
pub fn portal_router<A, D>(service: Arc<DirectHireService<A, D>>) -> Router
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    let body_limit = usize::try_from(service.policy().max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api/direct-hire", post(create_handler::<A, D>))
        .route(
            "/api/direct-hire/:application_id",
            get(fetch_handler::<A, D>)
                .patch(update_checklist_handler::<A, D>)
                .delete(delete_handler::<A, D>),
        )
        .route(
            "/api/direct-hire/:application_id/evaluation-checklist",
            post(evaluation_checklist_handler::<A, D>),
        )
        .route("/api/documents", get(list_documents_handler::<A, D>))
        .route(
            "/api/documents/upload",
            post(upload_handler::<A, D>).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChecklistUpdateRequest {
    pub(crate) status_checklist: StatusChecklist,
    #[serde(default)]
    pub(crate) version: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentQuery {
    pub(crate) application_id: String,
    pub(crate) application_type: ApplicationType,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OverrideQuery {
    #[serde(default, rename = "override")]
    pub(crate) override_existing: bool,
}

pub(crate) fn error_response(error: PortalServiceError) -> Response {
    let status = match &error {
        PortalServiceError::Submission(_)
        | PortalServiceError::File(_)
        | PortalServiceError::Metadata(_)
        | PortalServiceError::UnknownDocumentType(_)
        | PortalServiceError::Checklist(_)
        | PortalServiceError::MissingRequiredDocuments(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PortalServiceError::StaleVersion { .. }
        | PortalServiceError::ChecklistDocumentExists
        | PortalServiceError::Repository(RepositoryError::Conflict)
        | PortalServiceError::Repository(RepositoryError::VersionChanged { .. }) => {
            StatusCode::CONFLICT
        }
        PortalServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PortalServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "success": false,
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    let payload = json!({
        "success": false,
        "error": message.into(),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<A, D>(
    State(service): State<Arc<DirectHireService<A, D>>>,
    axum::Json(submission): axum::Json<DirectHireSubmission>,
) -> Response
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    match service.create(submission) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fetch_handler<A, D>(
    State(service): State<Arc<DirectHireService<A, D>>>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_checklist_handler<A, D>(
    State(service): State<Arc<DirectHireService<A, D>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ChecklistUpdateRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    let id = ApplicationId(application_id);
    match service.update_checklist(&id, request.status_checklist, request.version) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<A, D>(
    State(service): State<Arc<DirectHireService<A, D>>>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    match service.soft_delete(&ApplicationId(application_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluation_checklist_handler<A, D>(
    State(service): State<Arc<DirectHireService<A, D>>>,
    Path(application_id): Path<String>,
    Query(query): Query<OverrideQuery>,
) -> Response
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    let id = ApplicationId(application_id);
    match service.generate_evaluation_checklist(&id, query.override_existing) {
        Ok(document) => (
            StatusCode::CREATED,
            axum::Json(json!({ "success": true, "data": document })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_documents_handler<A, D>(
    State(service): State<Arc<DirectHireService<A, D>>>,
    Query(query): Query<DocumentQuery>,
) -> Response
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    let id = ApplicationId(query.application_id);
    match service.list_documents(&id, query.application_type) {
        Ok(documents) => (StatusCode::OK, axum::Json(documents)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Multipart fields collected before the upload is handed to the service.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadFile>,
    application_id: Option<String>,
    application_type: Option<String>,
    document_name: Option<String>,
    meta: Option<String>,
}

pub(crate) async fn upload_handler<A, D>(
    State(service): State<Arc<DirectHireService<A, D>>>,
    mut multipart: Multipart,
) -> Response
where
    A: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
{
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => return bad_request(error.body_text()),
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .and_then(|raw| raw.parse::<mime::Mime>().ok())
                .unwrap_or(mime::APPLICATION_OCTET_STREAM);
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(error) => return bad_request(error.body_text()),
            };
            form.file = Some(UploadFile::new(file_name, content_type, bytes.to_vec()));
            continue;
        }

        let text = match field.text().await {
            Ok(text) => text,
            Err(error) => return bad_request(error.body_text()),
        };
        match name.as_str() {
            "applicationId" => form.application_id = Some(text),
            "applicationType" => form.application_type = Some(text),
            "documentName" => form.document_name = Some(text),
            "meta" => form.meta = Some(text),
            _ => {}
        }
    }

    let Some(file) = form.file else {
        return bad_request("file is required");
    };
    let Some(application_id) = form.application_id.filter(|id| !id.trim().is_empty()) else {
        return bad_request("applicationId is required");
    };
    let Some(document_name) = form.document_name.filter(|name| !name.trim().is_empty()) else {
        return bad_request("documentName is required");
    };
    let application_type = match form.application_type.as_deref() {
        None => ApplicationType::DirectHire,
        Some(raw) => match ApplicationType::parse(raw) {
            Some(kind) => kind,
            None => return bad_request(format!("unsupported applicationType '{raw}'")),
        },
    };
    let meta = match form.meta.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match serde_json::from_str::<BTreeMap<String, String>>(raw) {
            Ok(meta) => Some(meta),
            Err(error) => return bad_request(format!("meta must be a JSON object of strings: {error}")),
        },
    };

    let upload = DocumentUpload {
        application_id: ApplicationId(application_id.trim().to_string()),
        application_type,
        document_name: document_name.trim().to_string(),
        file,
        meta,
    };

    match service.upload_document(upload) {
        Ok(receipt) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "data": receipt })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
