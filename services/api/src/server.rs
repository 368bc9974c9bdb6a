use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationRepository, InMemoryDocumentRepository};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dmw_portal::config::{AppConfig, ControlNumberConfig, DocumentPolicyConfig};
use dmw_portal::error::AppError;
use dmw_portal::telemetry;
use dmw_portal::workflows::direct_hire::{
    ControlNumberGenerator, DirectHireService, UploadPolicy,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let portal_service = build_portal_service(&config.documents, &config.control_numbers);
    let policy = portal_service.policy();

    let app = with_portal_routes(portal_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_upload_bytes = policy.max_bytes(),
        resumed_after = config.control_numbers.last_issued.as_deref().unwrap_or("none"),
        "direct hire portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

type PortalService = DirectHireService<InMemoryApplicationRepository, InMemoryDocumentRepository>;

/// Numbering continues after `APP_LAST_CONTROL_NUMBER` when it is set; otherwise
/// each process starts the daily and yearly sequences at 001.
fn build_portal_service(
    documents: &DocumentPolicyConfig,
    control_numbers: &ControlNumberConfig,
) -> Arc<PortalService> {
    let generator = control_numbers
        .last_issued
        .as_deref()
        .and_then(ControlNumberGenerator::resume_after)
        .unwrap_or_default();
    Arc::new(DirectHireService::with_control_numbers(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryDocumentRepository::default()),
        UploadPolicy::from(documents),
        generator,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dmw_portal::workflows::direct_hire::{
        Currency, DirectHireSubmission, MonetaryAmount, Sex,
    };

    fn submission() -> DirectHireSubmission {
        DirectHireSubmission {
            name: "Ana Reyes".to_string(),
            sex: Sex::Female,
            position: "Caregiver".to_string(),
            job_site: "Hong Kong".to_string(),
            employer: "Lee Household".to_string(),
            salary: MonetaryAmount::new(4990.0, Currency::Hkd),
        }
    }

    #[test]
    fn service_continues_numbering_from_configured_control_number() {
        let service = build_portal_service(
            &DocumentPolicyConfig::default(),
            &ControlNumberConfig {
                last_issued: Some("DHPSW-ROIVA-2025-0918-007-215".to_string()),
            },
        );
        let filed = Utc.with_ymd_and_hms(2025, 9, 18, 1, 30, 0).unwrap();

        let application = service.create_at(submission(), filed).expect("created");

        assert_eq!(application.control_number, "DHPSW-ROIVA-2025-0918-008-216");
    }

    #[test]
    fn service_starts_numbering_fresh_without_configuration() {
        let service =
            build_portal_service(&DocumentPolicyConfig::default(), &ControlNumberConfig::default());
        let filed = Utc.with_ymd_and_hms(2025, 9, 18, 1, 30, 0).unwrap();

        let application = service.create_at(submission(), filed).expect("created");

        assert_eq!(application.control_number, "DHPSW-ROIVA-2025-0918-001-001");
    }
}
