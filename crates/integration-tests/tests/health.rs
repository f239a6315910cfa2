//! Liveness, readiness and cross-cutting middleware.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};

use tribal_market_integration_tests::{FRONTEND_URL, TestApp};

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();

    let res = app.get("/health", None).await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn readiness_fails_without_database() {
    let app = TestApp::new();

    let res = app.get("/health/ready", None).await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::new();

    let res = app.get("/api/does-not-exist", None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();

    let res = app.send(request).await;

    assert_eq!(res.header("x-request-id"), Some("trace-abc-123"));
}

#[tokio::test]
async fn request_id_is_generated_when_missing() {
    let app = TestApp::new();

    let res = app.get("/health", None).await;

    let id = res.header("x-request-id").unwrap();
    assert!(!id.is_empty());
}

#[tokio::test]
async fn cors_preflight_allows_frontend() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/products")
        .header("origin", FRONTEND_URL)
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let res = app.send(request).await;

    assert_eq!(res.header("access-control-allow-origin"), Some(FRONTEND_URL));
    assert_eq!(res.header("access-control-allow-credentials"), Some("true"));
}
