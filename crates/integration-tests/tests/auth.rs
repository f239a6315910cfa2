//! Authentication endpoints and token handling.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use tribal_market_core::UserRole;
use tribal_market_integration_tests::TestApp;

#[tokio::test]
async fn me_requires_token() {
    let app = TestApp::new();

    let res = app.get("/api/auth/me", None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), Some("Authentication required"));
}

#[tokio::test]
async fn me_rejects_malformed_token() {
    let app = TestApp::new();

    let res = app.get("/api/auth/me", Some("not.a.jwt")).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), Some("Invalid or expired token"));
}

#[tokio::test]
async fn token_cookie_is_accepted_as_credentials() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/auth/me")
        .header("cookie", "theme=dark; token=garbage")
        .body(Body::empty())
        .unwrap();

    let res = app.send(request).await;

    // The cookie was found and verified, so the failure is about the token.
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), Some("Invalid or expired token"));
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let app = TestApp::new();
    let body = json!({
        "email": "not-an-email",
        "password": "long-enough-password",
        "name": "Asha",
    });

    let res = app.json("POST", "/api/auth/register", None, &body).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.error().is_some());
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = TestApp::new();
    let body = json!({
        "email": "asha@example.com",
        "password": "short",
        "name": "Asha",
        "role": "artist",
    });

    let res = app.json("POST", "/api/auth/register", None, &body).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_blank_name() {
    let app = TestApp::new();
    let body = json!({
        "email": "asha@example.com",
        "password": "long-enough-password",
        "name": "   ",
    });

    let res = app.json("POST", "/api/auth/register", None, &body).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_unknown_role() {
    let app = TestApp::new();
    let body = json!({
        "email": "asha@example.com",
        "password": "long-enough-password",
        "name": "Asha",
        "role": "admin",
    });

    let res = app.json("POST", "/api/auth/register", None, &body).await;

    assert!(res.status.is_client_error());
}

#[tokio::test]
async fn sign_in_endpoints_are_rate_limited() {
    let app = TestApp::new();
    let body = json!({
        "email": "bad",
        "password": "long-enough-password",
        "name": "Asha",
    });

    for _ in 0..5 {
        let res = app.json("POST", "/api/auth/register", None, &body).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
    }

    let res = app.json("POST", "/api/auth/register", None, &body).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn logout_expires_cookie() {
    let app = TestApp::new();

    let res = app.json("POST", "/api/auth/logout", None, &json!({})).await;

    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let cookie = res.header("set-cookie").unwrap();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn change_password_requires_token() {
    let app = TestApp::new();
    let body = json!({ "current_password": "a", "new_password": "b" });

    let res = app.json("POST", "/api/auth/password", None, &body).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn google_sign_in_unavailable_when_unconfigured() {
    let app = TestApp::new();

    // The session extractor resolves under /api/auth, so the handler
    // reaches its configuration check.
    let res = app.get("/api/auth/google", None).await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn issued_tokens_pass_authentication() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Buyer);

    // A buyer token reaches the role check on an artist route.
    let res = app.get("/api/artists/me", Some(&token)).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}
