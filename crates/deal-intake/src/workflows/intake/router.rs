use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AnswerValue, RespondentId};
use super::service::{IntakeService, IntakeServiceError};
use super::store::{DocumentStore, ProfileStore, UploadError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenRequest {
    #[serde(default)]
    start_phase: Option<usize>,
}

/// Router builder exposing the intake wizard and the admin read surface.
pub fn intake_router<P, D>(service: Arc<IntakeService<P, D>>) -> Router
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    Router::new()
        .route("/api/v1/intake/schema", get(schema_handler::<P, D>))
        .route("/api/v1/intake/:respondent_id", get(view_handler::<P, D>))
        .route(
            "/api/v1/intake/:respondent_id/open",
            post(open_handler::<P, D>),
        )
        .route(
            "/api/v1/intake/:respondent_id/answers/:question_id",
            put(answer_handler::<P, D>).delete(clear_handler::<P, D>),
        )
        .route(
            "/api/v1/intake/:respondent_id/uploads/:question_id/:filename",
            post(upload_handler::<P, D>),
        )
        .route(
            "/api/v1/intake/:respondent_id/advance",
            post(advance_handler::<P, D>),
        )
        .route(
            "/api/v1/intake/:respondent_id/back",
            post(back_handler::<P, D>),
        )
        .route(
            "/api/v1/intake/:respondent_id/phases/:index",
            post(jump_handler::<P, D>),
        )
        .route(
            "/api/v1/intake/:respondent_id/progress",
            get(progress_handler::<P, D>),
        )
        .route("/api/v1/admin/intake", get(admin_listing_handler::<P, D>))
        .route(
            "/api/v1/admin/intake/:respondent_id",
            get(admin_handler::<P, D>),
        )
        .with_state(service)
}

pub(crate) async fn schema_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    (StatusCode::OK, axum::Json(service.schema().as_ref())).into_response()
}

pub(crate) async fn open_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path(respondent_id): Path<String>,
    request: Option<axum::Json<OpenRequest>>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    let request = request.map(|axum::Json(request)| request).unwrap_or_default();
    let respondent = RespondentId(respondent_id);
    respond(service.open(&respondent, request.start_phase))
}

pub(crate) async fn view_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path(respondent_id): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.view(&RespondentId(respondent_id)))
}

pub(crate) async fn answer_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path((respondent_id, question_id)): Path<(String, String)>,
    axum::Json(value): axum::Json<AnswerValue>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.record_answer(&RespondentId(respondent_id), &question_id, value))
}

pub(crate) async fn clear_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path((respondent_id, question_id)): Path<(String, String)>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.clear_answer(&RespondentId(respondent_id), &question_id))
}

pub(crate) async fn upload_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path((respondent_id, question_id, filename)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);

    let result = service.upload(
        &RespondentId(respondent_id),
        &question_id,
        &filename,
        content_type,
        body.to_vec(),
    );
    match result {
        Ok(reference) => (StatusCode::CREATED, axum::Json(reference)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path(respondent_id): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.advance(&RespondentId(respondent_id)))
}

pub(crate) async fn back_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path(respondent_id): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.back(&RespondentId(respondent_id)))
}

pub(crate) async fn jump_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path((respondent_id, index)): Path<(String, usize)>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.jump_to(&RespondentId(respondent_id), index))
}

pub(crate) async fn progress_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path(respondent_id): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.progress(&RespondentId(respondent_id)))
}

pub(crate) async fn admin_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
    Path(respondent_id): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.admin_view(&RespondentId(respondent_id)))
}

pub(crate) async fn admin_listing_handler<P, D>(
    State(service): State<Arc<IntakeService<P, D>>>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    respond(service.admin_listing())
}

fn respond<T: serde::Serialize>(result: Result<T, IntakeServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: IntakeServiceError) -> Response {
    let status = match &err {
        IntakeServiceError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        IntakeServiceError::Answer(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeServiceError::Navigation(_) => StatusCode::CONFLICT,
        IntakeServiceError::Upload(UploadError::EmptyFile) => StatusCode::BAD_REQUEST,
        IntakeServiceError::Upload(UploadError::NotAFileQuestion(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        IntakeServiceError::Upload(UploadError::Transport(_)) => StatusCode::BAD_GATEWAY,
        IntakeServiceError::Persistence(_) | IntakeServiceError::SessionsUnavailable => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
