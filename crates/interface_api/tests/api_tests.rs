//! HTTP API tests
//!
//! Drive the full router (auth, audit, handlers) over the in-memory
//! adapters.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use domain_claims::{InMemoryClaimStore, WorkflowConfig, WorkflowService};
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};

fn app() -> (Router, ApiConfig) {
    let config = ApiConfig::default();
    let workflow =
        WorkflowService::new(Arc::new(InMemoryClaimStore::new()), WorkflowConfig::default());
    (create_router(AppState::new(workflow, config.clone())), config)
}

fn token(config: &ApiConfig, sub: &str, role: &str) -> String {
    create_token(sub, vec![role.to_string()], &config.jwt_secret, 300).unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

async fn submit(app: &Router, token: &str, hours: &str, rate: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/v1/claims",
            token,
            json!({ "hours_worked": hours, "hourly_rate": rate, "claim_month": "2024-03" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/health/ready").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adapters"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/api/v1/claims")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_token_without_known_role_is_unauthorized() {
    let (app, config) = app();
    let token = token(&config, "someone", "Janitor");
    let (status, _) = send(&app, get_request("/api/v1/claims", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submit_computes_amount_and_starts_pending() {
    let (app, config) = app();
    let lecturer = token(&config, "L1", "Lecturer");

    let claim = submit(&app, &lecturer, "40", "250").await;
    assert_eq!(decimal(&claim["amount"]), dec!(10000));
    assert_eq!(claim["status"], "Pending");
    assert_eq!(claim["lecturer_id"], "L1");
    assert_eq!(claim["claim_month"], "2024-03");
    assert_eq!(claim["version"], 1);
    assert_eq!(claim["history"].as_array().unwrap().len(), 1);

    let (status, list) = send(&app, get_request("/api/v1/claims", &lecturer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_zero_hours_is_unprocessable() {
    let (app, config) = app();
    let lecturer = token(&config, "L1", "Lecturer");
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/claims",
            &lecturer,
            json!({ "hours_worked": "0", "hourly_rate": "250" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_out_of_range_quantities_are_unprocessable() {
    let (app, config) = app();
    let lecturer = token(&config, "L1", "Lecturer");
    for (hours, rate) in [("1.00005", "1"), ("10", "0.00001"), ("100000000", "250")] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/claims",
                &lecturer,
                json!({ "hours_worked": hours, "hourly_rate": rate }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{} x {}", hours, rate);
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_lecturer_cannot_decide() {
    let (app, config) = app();
    let lecturer = token(&config, "L1", "Lecturer");
    let claim = submit(&app, &lecturer, "10", "300").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/claims/{}/decision", claim["id"]),
            &lecturer,
            json!({ "decision": "approve" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");
}

#[tokio::test]
async fn test_other_lecturers_claim_is_not_found() {
    let (app, config) = app();
    let claim = submit(&app, &token(&config, "L1", "Lecturer"), "10", "300").await;

    let uri = format!("/api/v1/claims/{}", claim["reference"].as_str().unwrap());
    let (status, _) = send(&app, get_request(&uri, &token(&config, "L2", "Lecturer"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get_request(&uri, &token(&config, "pc", "ProgrammeCoordinator"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], claim["id"]);
}

#[tokio::test]
async fn test_stale_version_conflicts() {
    let (app, config) = app();
    let claim = submit(&app, &token(&config, "L1", "Lecturer"), "10", "300").await;
    let coordinator = token(&config, "pc", "Coordinator");
    let uri = format!("/api/v1/claims/{}/verify", claim["id"]);

    let (status, verified) = send(
        &app,
        json_request("POST", &uri, &coordinator, json!({ "expected_version": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["status"], "Verified");
    assert_eq!(verified["verified_by"], "pc");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/claims/{}/decision", claim["id"]),
            &token(&config, "am", "AcademicManager"),
            json!({ "decision": "approve", "expected_version": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_rejected_claim_cannot_be_approved() {
    let (app, config) = app();
    let claim = submit(&app, &token(&config, "L1", "Lecturer"), "10", "300").await;
    let coordinator = token(&config, "pc", "Coordinator");
    let uri = format!("/api/v1/claims/{}/decision", claim["id"]);

    let (status, _) = send(&app, json_request("POST", &uri, &coordinator, json!({ "decision": "reject" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, json_request("POST", &uri, &coordinator, json!({ "decision": "approve" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");
}

#[tokio::test]
async fn test_review_queue_and_batch_approve() {
    let (app, config) = app();
    let lecturer = token(&config, "L1", "Lecturer");
    let coordinator = token(&config, "pc", "Coordinator");
    let hr = token(&config, "hr1", "HR");

    let first = submit(&app, &lecturer, "10", "300").await;
    let second = submit(&app, &lecturer, "5", "300").await;
    submit(&app, &lecturer, "1", "300").await;

    let (status, queue) = send(&app, get_request("/api/v1/claims/queue", &coordinator)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 3);

    for claim in [&first, &second] {
        let uri = format!("/api/v1/claims/{}/verify", claim["id"]);
        let (status, _) = send(&app, json_request("POST", &uri, &coordinator, json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, queue) = send(&app, get_request("/api/v1/claims/queue", &hr)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 2);

    let (status, report) = send(
        &app,
        json_request("POST", "/api/v1/claims/batch-approve", &hr, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["approved"].as_array().unwrap().len(), 2);
    assert!(report["failed"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        json_request("POST", "/api/v1/claims/batch-approve", &lecturer, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invoice_totals_approved_claims() {
    let (app, config) = app();
    let coordinator = token(&config, "pc", "Coordinator");
    let hr = token(&config, "hr1", "HR");

    let a = submit(&app, &token(&config, "L1", "Lecturer"), "40", "250").await;
    let b = submit(&app, &token(&config, "L2", "Lecturer"), "10", "300").await;
    submit(&app, &token(&config, "L3", "Lecturer"), "8", "100").await;

    for claim in [&a, &b] {
        let uri = format!("/api/v1/claims/{}/decision", claim["id"]);
        let (status, _) = send(&app, json_request("POST", &uri, &coordinator, json!({ "decision": "approve" }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, invoice) = send(&app, get_request("/api/v1/invoices", &hr)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&invoice["total_payment"]), dec!(13000));
    assert_eq!(invoice["claim_count"], 2);

    let lines = invoice["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["lecturer_id"], "L1");
    assert_eq!(lines[0]["period"], "3/2024");
    assert_eq!(decimal(&lines[1]["total_amount"]), dec!(3000));

    let (status, _) = send(&app, get_request("/api/v1/invoices", &coordinator)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upload_reports_each_file() {
    let (app, config) = app();
    let body = concat!(
        "--BOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"file\"; filename=\"timesheet.pdf\"\r\n",
        "Content-Type: application/pdf\r\n\r\n",
        "%PDF-1.4\r\n",
        "--BOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"file\"; filename=\"setup.exe\"\r\n",
        "Content-Type: application/octet-stream\r\n\r\n",
        "MZ\r\n",
        "--BOUNDARY--\r\n",
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/attachments")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token(&config, "L1", "Lecturer")),
        )
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let (status, report) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["accepted"][0]["file_name"], "timesheet.pdf");
    assert!(report["accepted"][0]["handle"].as_str().unwrap().ends_with(".pdf"));
    assert_eq!(report["rejected"][0]["file_name"], "setup.exe");
}

#[tokio::test]
async fn test_lecturer_register_and_update() {
    let (app, config) = app();
    let hr = token(&config, "hr1", "HR");

    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/lecturers",
            &hr,
            json!({ "lecturer_id": "L1", "name": "T. Mokoena", "email": "t.mokoena@example.ac.za" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "T. Mokoena");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/v1/lecturers",
            &hr,
            json!({ "lecturer_id": "L2", "name": "X", "email": "not-an-email" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, updated) = send(
        &app,
        json_request("PUT", "/api/v1/lecturers/L1", &hr, json!({ "phone": "+27 21 555 0100" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+27 21 555 0100");
    assert_eq!(updated["email"], "t.mokoena@example.ac.za");

    let (status, _) = send(&app, get_request("/api/v1/lecturers", &token(&config, "L1", "Lecturer"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
