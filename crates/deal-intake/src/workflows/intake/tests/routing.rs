use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::intake::domain::AnswerValue;
use crate::workflows::intake::IntakeService;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn open_route_returns_first_phase() {
    let (service, _, _) = build_service();
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(json_request("POST", "/api/v1/intake/seller-42/open", json!({})))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["position"], json!({"state": "phase", "index": 0}));
    assert_eq!(payload["phase"]["phase_id"], "basics");
    assert_eq!(payload["progress"]["percent"], 0);
}

#[tokio::test]
async fn schema_route_lists_phases() {
    let (service, _, _) = build_service();
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/intake/schema"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["phases"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn view_without_session_is_not_found() {
    let (service, _, _) = build_service();
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/intake/ghost"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some());
}

#[tokio::test]
async fn answer_handler_rejects_kind_mismatch() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.open(&respondent(), None).expect("session opens");

    let response = crate::workflows::intake::router::answer_handler::<
        MemoryProfiles,
        MemoryDocuments,
    >(
        State(service.clone()),
        Path((respondent().0, "has_partner".to_string())),
        axum::Json(AnswerValue::text("yes")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn blocked_advance_is_ok_with_error_map() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.open(&respondent(), None).expect("session opens");

    let response = crate::workflows::intake::router::advance_handler::<
        MemoryProfiles,
        MemoryDocuments,
    >(State(service.clone()), Path(respondent().0))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"]["status"], "blocked");
    assert_eq!(
        payload["outcome"]["errors"]["owner_name"],
        "This field is required"
    );
}

#[tokio::test]
async fn answer_then_advance_over_http() {
    let (service, profiles, _) = build_service();
    let service = Arc::new(service);
    service.open(&respondent(), None).expect("session opens");
    let router = crate::workflows::intake::intake_router(service.clone());

    for (id, value) in [
        ("owner_name", json!("Dana Reyes")),
        ("owners_agree", json!(true)),
        ("has_partner", json!(false)),
    ] {
        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/intake/seller-42/answers/{id}"),
                value,
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK, "answer {id} accepted");
    }

    let response = router
        .oneshot(empty_request("POST", "/api/v1/intake/seller-42/advance"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"]["status"], "moved");
    assert_eq!(payload["outcome"]["to"], 1);
    assert_eq!(profiles.save_count(), 1);
}

#[tokio::test]
async fn jump_out_of_range_conflicts() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.open(&respondent(), None).expect("session opens");

    let response = crate::workflows::intake::router::jump_handler::<
        MemoryProfiles,
        MemoryDocuments,
    >(State(service.clone()), Path((respondent().0, 7)))
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn upload_route_records_file_reference() {
    let (service, _, documents) = build_service();
    let service = Arc::new(service);
    service.open(&respondent(), Some(3)).expect("session opens");
    let router = crate::workflows::intake::intake_router(service.clone());

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/intake/seller-42/uploads/title_deed/deed.pdf")
                .header(header::CONTENT_TYPE, "application/pdf")
                .body(Body::from("%PDF-1.7"))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload, json!({"id": "doc-1", "filename": "deed.pdf"}));
    assert_eq!(documents.uploads()[0].content_type, mime::APPLICATION_PDF);
}

#[tokio::test]
async fn upload_failure_maps_to_bad_gateway() {
    let service = IntakeService::new(
        sample_schema(),
        Arc::new(MemoryProfiles::default()),
        Arc::new(UnavailableDocuments),
    );
    service.open(&respondent(), Some(3)).expect("session opens");
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/intake/seller-42/uploads/title_deed/deed.pdf")
                .body(Body::from("%PDF-1.7"))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn admin_route_reads_stored_answers() {
    let profiles = Arc::new(MemoryProfiles::seeded(&respondent(), basics_answers()));
    let service = IntakeService::new(
        sample_schema(),
        profiles,
        Arc::new(MemoryDocuments::default()),
    );
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/admin/intake/seller-42"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["started"], true);
    assert_eq!(payload["progress_percent"], 25);
    assert_eq!(
        payload["sections"][0]["entries"][0]["answer"],
        json!({"type": "text", "text": "Dana Reyes"})
    );
}

#[tokio::test]
async fn open_route_accepts_missing_body() {
    let (service, _, _) = build_service();
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(empty_request("POST", "/api/v1/intake/seller-42/open"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["position"], json!({"state": "phase", "index": 0}));
}

#[tokio::test]
async fn open_route_honours_start_phase() {
    let (service, _, _) = build_service();
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/intake/seller-42/open",
            json!({"start_phase": 2}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["phase"]["phase_id"], "financials");
}

#[tokio::test]
async fn upload_client_errors_are_not_gateway_failures() {
    let (service, _, documents) = build_service();
    let service = Arc::new(service);
    service.open(&respondent(), Some(3)).expect("session opens");
    let router = crate::workflows::intake::intake_router(service.clone());

    let empty = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/intake/seller-42/uploads/title_deed/deed.pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let wrong_question = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/intake/seller-42/uploads/lease_or_own/deed.pdf")
                .body(Body::from("%PDF-1.7"))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(wrong_question.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(documents.uploads().is_empty());
}

#[tokio::test]
async fn admin_listing_route_lists_respondents() {
    let profiles = Arc::new(MemoryProfiles::seeded(&respondent(), basics_answers()));
    let service = IntakeService::new(
        sample_schema(),
        profiles,
        Arc::new(MemoryDocuments::default()),
    );
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/admin/intake"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload,
        json!([{"respondent": "seller-42", "started": true, "progress_percent": 25}])
    );
}

#[tokio::test]
async fn admin_listing_route_reports_store_failure() {
    let service = IntakeService::new(
        sample_schema(),
        Arc::new(UnavailableProfiles),
        Arc::new(MemoryDocuments::default()),
    );
    let router = intake_router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/admin/intake"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
