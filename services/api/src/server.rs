use crate::cli::ServeArgs;
use crate::infra::{load_schema, AppState, InMemoryDocumentStore, InMemoryProfileStore};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use deal_intake::config::AppConfig;
use deal_intake::error::AppError;
use deal_intake::telemetry;
use deal_intake::workflows::intake::IntakeService;
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

    let schema = Arc::new(load_schema(&config.intake, None)?);
    info!(
        phases = schema.phase_count(),
        questions = schema.question_count(),
        custom = config.intake.schema_path.is_some(),
        "intake schema loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let documents = Arc::new(InMemoryDocumentStore::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        documents: documents.clone(),
    };

    let profiles = Arc::new(InMemoryProfileStore::default());
    let intake_service = Arc::new(IntakeService::new(schema, profiles, documents));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "deal intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
