use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use deal_intake::workflows::intake::{intake_router, DocumentStore, IntakeService, ProfileStore};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_intake_routes<P, D>(service: Arc<IntakeService<P, D>>) -> axum::Router
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    intake_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/documents/:document_id",
            axum::routing::get(document_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serve an uploaded document as an attachment; admin download links point here.
pub(crate) async fn document_endpoint(
    Extension(state): Extension<AppState>,
    Path(document_id): Path<String>,
) -> Response {
    let Some(blob) = state.documents.fetch(&document_id) else {
        let payload = json!({ "error": format!("document {document_id} not found") });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        blob.metadata.reference.filename.replace('"', "")
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, blob.metadata.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        blob.bytes,
    )
        .into_response()
}
