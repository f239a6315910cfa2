//! Public catalog validation that happens before any query runs.

use axum::http::StatusCode;

use tribal_market_integration_tests::TestApp;

#[tokio::test]
async fn price_range_must_be_ordered() {
    let app = TestApp::new();

    let res = app
        .get("/api/products?min_price=50&max_price=10", None)
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), Some("min_price cannot exceed max_price"));
}

#[tokio::test]
async fn negative_price_filter_is_rejected() {
    let app = TestApp::new();

    let res = app.get("/api/products?min_price=-5", None).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_id_must_be_numeric() {
    let app = TestApp::new();

    let res = app.get("/api/products/abc", None).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
