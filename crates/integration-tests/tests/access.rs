//! Role checks on buyer and artist endpoints.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use tribal_market_core::UserRole;
use tribal_market_integration_tests::{CLIENT_IP, TestApp};

#[tokio::test]
async fn buyer_routes_reject_artists() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Artist);

    for uri in ["/api/cart", "/api/wishlist", "/api/buyers/me", "/api/orders"] {
        let res = app.get(uri, Some(&token)).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn artist_routes_reject_buyers() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Buyer);

    for uri in [
        "/api/artists/me",
        "/api/artists/me/products",
        "/api/artists/me/orders",
        "/api/artists/me/stats",
    ] {
        let res = app.get(uri, Some(&token)).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn buyers_cannot_create_products() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Buyer);
    let body = json!({
        "name": "Dokra horse",
        "description": "Lost-wax brass casting",
        "price": "45.00",
        "stock": 3,
        "category_id": 1,
    });

    let res = app.json("POST", "/api/products", Some(&token), &body).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn buyers_cannot_create_categories() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Buyer);
    let body = json!({ "name": "Textiles" });

    let res = app.json("POST", "/api/categories", Some(&token), &body).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn artists_cannot_place_orders() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Artist);

    let res = app
        .json("POST", "/api/orders", Some(&token), &json!({ "from_cart": true }))
        .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn buyers_cannot_update_fulfilment_status() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Buyer);

    let res = app
        .json(
            "PATCH",
            "/api/orders/1/status",
            Some(&token),
            &json!({ "status": "shipped" }),
        )
        .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn artists_cannot_write_reviews() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Artist);

    let res = app
        .json(
            "POST",
            "/api/products/1/reviews",
            Some(&token),
            &json!({ "rating": 5 }),
        )
        .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn uploads_require_artist() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Buyer);
    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads/images")
        .header("authorization", format!("Bearer {token}"))
        .header("x-forwarded-for", CLIENT_IP)
        .header("content-type", "multipart/form-data; boundary=X")
        .body(Body::from("--X--\r\n"))
        .unwrap();

    let res = app.send(request).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn anonymous_cart_is_unauthorized() {
    let app = TestApp::new();

    let res = app.get("/api/cart", None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
