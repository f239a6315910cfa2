//! Stock, order lifecycle, cart and review flows against a real database.
//!
//! These tests need a migrated `PostgreSQL` reachable through
//! `MARKET_DATABASE_URL` (or `DATABASE_URL`):
//!
//! ```bash
//! MARKET_DATABASE_URL=postgres://localhost/tm_test \
//!     cargo test -p tribal-market-integration-tests --test orders_db -- --ignored
//! ```
//!
//! Every fixture gets a unique email and slug, so runs can share a database.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use tribal_market_api::db::orders::NewOrder;
use tribal_market_api::db::users::NewUser;
use tribal_market_api::db::{
    ArtistRepository, BuyerRepository, CartRepository, CategoryRepository, OrderRepository,
    ProductRepository, RepositoryError, ReviewRepository, UserRepository, WishlistRepository,
};
use tribal_market_api::error::AppError;
use tribal_market_api::models::{
    NewProduct, Order, OrderLineInput, Product, ReviewInput, ShippingAddress, User,
};
use tribal_market_core::{
    ArtistId, BuyerId, CategoryId, Email, OrderStatus, Pagination, PaymentStatus, Price,
    ProductId, Rating, UserRole,
};

static SEQ: AtomicU32 = AtomicU32::new(0);

fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}-{}", SEQ.fetch_add(1, Ordering::Relaxed))
}

async fn pool() -> PgPool {
    let url = std::env::var("MARKET_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("MARKET_DATABASE_URL or DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../api/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

async fn user(pool: &PgPool, role: UserRole) -> User {
    let email = Email::parse(&format!("{}@example.com", unique("db"))).unwrap();
    UserRepository::new(pool)
        .create_with_profile(NewUser {
            email: &email,
            name: "Test Account",
            role,
            password_hash: Some("not-a-real-hash"),
            google_id: None,
        })
        .await
        .unwrap()
}

async fn artist(pool: &PgPool) -> ArtistId {
    let user = user(pool, UserRole::Artist).await;
    ArtistRepository::new(pool)
        .id_for_user(user.id)
        .await
        .unwrap()
        .unwrap()
}

async fn buyer(pool: &PgPool) -> BuyerId {
    let user = user(pool, UserRole::Buyer).await;
    BuyerRepository::new(pool)
        .id_for_user(user.id)
        .await
        .unwrap()
        .unwrap()
}

async fn category(pool: &PgPool) -> CategoryId {
    let slug = unique("textiles");
    CategoryRepository::new(pool)
        .create("Textiles", &slug, None)
        .await
        .unwrap()
        .id
}

async fn product(pool: &PgPool, artist_id: ArtistId, whole: i64, stock: i32) -> Product {
    let category_id = category(pool).await;
    ProductRepository::new(pool)
        .create(
            artist_id,
            &NewProduct {
                name: unique("Warli painting"),
                description: "Rice paste on mud-finished cloth".to_owned(),
                price: Price::new(Decimal::new(whole, 0)).unwrap(),
                stock,
                category_id,
                images: Vec::new(),
                materials: vec!["cotton".to_owned()],
            },
        )
        .await
        .unwrap()
}

async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    ProductRepository::new(pool)
        .get(id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Meera Toppo".to_owned(),
        line1: "12 Station Road".to_owned(),
        line2: None,
        city: "Ranchi".to_owned(),
        state: "Jharkhand".to_owned(),
        postal_code: "834001".to_owned(),
        country: "IN".to_owned(),
        phone: "+91 90000 00000".to_owned(),
    }
}

fn line(product: &Product, quantity: i32) -> OrderLineInput {
    OrderLineInput {
        product_id: product.id,
        quantity,
    }
}

async fn place(
    pool: &PgPool,
    buyer_id: BuyerId,
    lines: &[OrderLineInput],
    clear_cart: bool,
) -> Result<Order, RepositoryError> {
    let address = address();
    OrderRepository::new(pool)
        .create(NewOrder {
            buyer_id,
            lines,
            shipping_address: &address,
            notes: None,
            clear_cart,
        })
        .await
}

fn status_of(err: RepositoryError) -> StatusCode {
    AppError::from(err).into_response().status()
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_order_decrements_stock() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let basket = product(&pool, artist_id, 450, 5).await;

    let order = place(&pool, buyer_id, &[line(&basket, 2)], false).await.unwrap();

    assert_eq!(order.total_amount.to_string(), "900.00");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(stock_of(&pool, basket.id).await, 3);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_failed_order_leaves_stock_untouched() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let plenty = product(&pool, artist_id, 100, 10).await;
    let scarce = product(&pool, artist_id, 100, 1).await;

    let err = place(&pool, buyer_id, &[line(&plenty, 4), line(&scarce, 2)], false)
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::InsufficientStock { .. }));
    assert_eq!(stock_of(&pool, plenty.id).await, 10);
    assert_eq!(stock_of(&pool, scarce.id).await, 1);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_oversized_total_is_rejected_before_stock_moves() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let costly = product(&pool, artist_id, 999_999_999, 1_000).await;

    let err = place(&pool, buyer_id, &[line(&costly, 20)], false)
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::TotalTooLarge(_)));
    assert_eq!(stock_of(&pool, costly.id).await, 1_000);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_order_from_cart_clears_cart() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let shawl = product(&pool, artist_id, 1_200, 4).await;
    let cart = CartRepository::new(&pool);
    cart.add(buyer_id, shawl.id, 2).await.unwrap();

    let lines: Vec<OrderLineInput> = cart
        .lines(buyer_id)
        .await
        .unwrap()
        .iter()
        .map(|l| OrderLineInput {
            product_id: l.product_id,
            quantity: l.quantity,
        })
        .collect();
    place(&pool, buyer_id, &lines, true).await.unwrap();

    assert!(cart.lines(buyer_id).await.unwrap().is_empty());
    assert_eq!(stock_of(&pool, shawl.id).await, 2);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_cancel_restores_stock_and_refunds() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let mask = product(&pool, artist_id, 800, 3).await;
    let orders = OrderRepository::new(&pool);

    let order = place(&pool, buyer_id, &[line(&mask, 3)], false).await.unwrap();
    assert_eq!(stock_of(&pool, mask.id).await, 0);

    orders
        .update_payment(order.id, PaymentStatus::Paid, Some("pay_123"))
        .await
        .unwrap();
    let cancelled = orders
        .update_status(order.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
    assert_eq!(stock_of(&pool, mask.id).await, 3);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_cancel_unpaid_order_keeps_payment_status() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let bowl = product(&pool, artist_id, 300, 2).await;

    let order = place(&pool, buyer_id, &[line(&bowl, 1)], false).await.unwrap();
    let cancelled = OrderRepository::new(&pool)
        .update_status(order.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    assert_eq!(cancelled.payment_status, PaymentStatus::Pending);
    assert_eq!(stock_of(&pool, bowl.id).await, 2);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_artist_sees_only_their_lines() {
    let pool = pool().await;
    let weaver = artist(&pool).await;
    let potter = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let rug = product(&pool, weaver, 2_000, 5).await;
    let pot = product(&pool, potter, 250, 5).await;

    let order = place(&pool, buyer_id, &[line(&rug, 1), line(&pot, 2)], false)
        .await
        .unwrap();
    assert_eq!(order.total_amount.to_string(), "2500.00");

    let page = OrderRepository::new(&pool)
        .list_for_artist(potter, Pagination::default())
        .await
        .unwrap();

    let view = page
        .items
        .iter()
        .find(|o| o.id == order.id)
        .expect("order listed for the potter");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].product_id, pot.id);
    assert_eq!(view.artist_subtotal.to_string(), "500.00");
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_cart_add_increments_up_to_stock() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let scarf = product(&pool, artist_id, 600, 3).await;
    let cart = CartRepository::new(&pool);

    assert_eq!(cart.add(buyer_id, scarf.id, 2).await.unwrap(), 2);
    assert_eq!(cart.add(buyer_id, scarf.id, 1).await.unwrap(), 3);

    let err = cart.add(buyer_id, scarf.id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::InsufficientStock {
            available: 3,
            requested: 4,
            ..
        }
    ));
    assert_eq!(cart.lines(buyer_id).await.unwrap()[0].quantity, 3);
}

// ============================================================================
// Reviews and wishlist
// ============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_review_marks_verified_purchase() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let bought = product(&pool, artist_id, 150, 5).await;
    let browsed = product(&pool, artist_id, 150, 5).await;
    let orders = OrderRepository::new(&pool);

    let order = place(&pool, buyer_id, &[line(&bought, 1)], false).await.unwrap();
    for next in [OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered] {
        orders.update_status(order.id, next, None).await.unwrap();
    }

    let reviews = ReviewRepository::new(&pool);
    let input = ReviewInput {
        rating: Rating::new(5).unwrap(),
        comment: Some("Even weave, lovely colours".to_owned()),
    };
    let verified = reviews.create(buyer_id, bought.id, &input).await.unwrap();
    let unverified = reviews.create(buyer_id, browsed.id, &input).await.unwrap();

    assert!(verified.verified_purchase);
    assert!(!unverified.verified_purchase);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_duplicate_review_is_conflict() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let lamp = product(&pool, artist_id, 700, 5).await;
    let reviews = ReviewRepository::new(&pool);
    let input = ReviewInput {
        rating: Rating::new(4).unwrap(),
        comment: None,
    };

    reviews.create(buyer_id, lamp.id, &input).await.unwrap();
    let err = reviews.create(buyer_id, lamp.id, &input).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert_eq!(status_of(err), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_duplicate_wishlist_entry_is_conflict() {
    let pool = pool().await;
    let artist_id = artist(&pool).await;
    let buyer_id = buyer(&pool).await;
    let doll = product(&pool, artist_id, 350, 5).await;
    let wishlist = WishlistRepository::new(&pool);

    wishlist.add(buyer_id, doll.id).await.unwrap();
    let err = wishlist.add(buyer_id, doll.id).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert_eq!(status_of(err), StatusCode::CONFLICT);
}
