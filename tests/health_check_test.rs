//! Health endpoint and ambient response headers.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{read_json, TestApp};

#[tokio::test]
async fn test_health_check_returns_200_when_the_store_is_up() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "identity-service-test");
    assert_eq!(body["checks"]["store"], "up");
}

#[tokio::test]
async fn test_health_check_fails_when_the_store_is_down() {
    let app = TestApp::new();
    app.store.set_fail_reads(true);

    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "InternalError");
    // Internal detail stays server-side; the caller gets a correlation id.
    assert!(body["message"].as_str().unwrap().contains("error id"));
}

#[tokio::test]
async fn test_responses_echo_or_mint_a_request_id() {
    let app = TestApp::new();

    let minted = app.get("/health", None).await;
    assert!(minted.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "caller-supplied-id")
        .body(Body::empty())
        .unwrap();
    let echoed = app.send(request).await;
    assert_eq!(
        echoed.headers().get("x-request-id").unwrap(),
        "caller-supplied-id"
    );
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("strict-transport-security"));
    assert!(headers.contains_key("content-security-policy"));
}
