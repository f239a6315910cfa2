//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited)
//! POST   /api/auth/register                     - Create account + profile
//! POST   /api/auth/login                        - Email/password sign-in
//! GET    /api/auth/google                       - Redirect to Google
//! GET    /api/auth/google/callback              - Google OAuth callback
//! GET    /api/auth/me                           - Current user
//! POST   /api/auth/logout                       - Clear token cookie
//! POST   /api/auth/password                     - Change password
//!
//! # Artists
//! GET    /api/artists                           - Public artist list
//! GET    /api/artists/{id}                      - Public artist profile
//! GET    /api/artists/me                        - Own profile (artist)
//! PUT    /api/artists/me                        - Update own profile (artist)
//! GET    /api/artists/me/products               - Own products (artist)
//! GET    /api/artists/me/orders                 - Orders with own items (artist)
//! GET    /api/artists/me/stats                  - Dashboard figures (artist)
//!
//! # Buyers
//! GET    /api/buyers/me                         - Own profile (buyer)
//! PUT    /api/buyers/me                         - Update own profile (buyer)
//!
//! # Catalog
//! GET    /api/categories                        - All categories
//! POST   /api/categories                        - Create category (artist)
//! GET    /api/categories/{slug}                 - One category
//! GET    /api/products                          - Search active products
//! POST   /api/products                          - Create product (artist)
//! GET    /api/products/{id}                     - Product detail
//! PUT    /api/products/{id}                     - Update product (owner)
//! DELETE /api/products/{id}                     - Deactivate product (owner)
//! GET    /api/products/{id}/reviews             - Reviews + rating summary
//! POST   /api/products/{id}/reviews             - Write review (buyer)
//! PUT    /api/reviews/{id}                      - Edit review (author)
//! DELETE /api/reviews/{id}                      - Delete review (author)
//! POST   /api/uploads/images                    - Upload images (artist)
//!
//! # Cart & wishlist (buyer)
//! GET    /api/cart                              - Cart with totals
//! DELETE /api/cart                              - Empty cart
//! POST   /api/cart/items                        - Add product
//! PUT    /api/cart/items/{product_id}           - Set quantity (0 removes)
//! DELETE /api/cart/items/{product_id}           - Remove line
//! GET    /api/wishlist                          - Saved products
//! POST   /api/wishlist                          - Save product
//! DELETE /api/wishlist/{product_id}             - Forget product
//! GET    /api/wishlist/{product_id}/check       - Is it saved?
//! POST   /api/wishlist/{product_id}/move-to-cart - Move to cart
//!
//! # Orders
//! GET    /api/orders                            - Own orders (buyer)
//! POST   /api/orders                            - Place order (buyer)
//! GET    /api/orders/{id}                       - Buyer or involved artist
//! POST   /api/orders/{id}/cancel                - Cancel + restock (buyer)
//! PATCH  /api/orders/{id}/status                - Fulfilment status (artist)
//! PATCH  /api/orders/{id}/payment               - Payment status (buyer)
//! ```

pub mod artists;
pub mod auth;
pub mod buyers;
pub mod cart;
pub mod categories;
pub mod google_auth;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
pub mod wishlist;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
};

use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Sign-in endpoints share one per-IP limiter; the authenticated endpoints
/// are not limited. Sessions exist only under this router, for the Google
/// OAuth state.
pub fn auth_routes(session_layer: SessionManagerLayer<PostgresStore>) -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/google", get(google_auth::start))
        .route("/google/callback", get(google_auth::callback))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/password", post(auth::change_password))
        .merge(limited)
        .layer(session_layer)
}

/// Create the artist routes router.
pub fn artist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(artists::index))
        .route("/me", get(artists::me).put(artists::update_me))
        .route("/me/products", get(artists::my_products))
        .route("/me/orders", get(artists::my_orders))
        .route("/me/stats", get(artists::my_stats))
        .route("/{id}", get(artists::show))
}

/// Create the buyer routes router.
pub fn buyer_routes() -> Router<AppState> {
    Router::new().route("/me", get(buyers::me).put(buyers::update_me))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/{slug}", get(categories::show))
}

/// Create the product and review routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/{id}/reviews",
            get(reviews::index).post(reviews::create),
        )
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/{id}", put(reviews::update).delete(reviews::delete))
}

/// Create the upload routes router.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/images", post(uploads::upload_images))
        .layer(DefaultBodyLimit::max(uploads::UPLOAD_BODY_LIMIT))
        .layer(api_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::set_quantity).delete(cart::remove),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index).post(wishlist::add))
        .route("/{product_id}", axum::routing::delete(wishlist::remove))
        .route("/{product_id}/check", get(wishlist::check))
        .route("/{product_id}/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/payment", patch(orders::update_payment))
}

/// Create all `/api` routes.
pub fn routes(session_layer: SessionManagerLayer<PostgresStore>) -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes(session_layer))
        .nest("/artists", artist_routes())
        .nest("/buyers", buyer_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/reviews", review_routes())
        .nest("/uploads", upload_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/orders", order_routes());

    Router::new().nest("/api", api)
}
