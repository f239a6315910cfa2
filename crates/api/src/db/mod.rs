//! Database operations for the marketplace `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts (password and/or Google login)
//! - `artist_profiles`, `buyer_profiles` - One profile per user, by role
//! - `categories`, `products` - The catalog
//! - `cart_items`, `wishlist_items` - Buyer collections
//! - `reviews` - One per buyer per product
//! - `orders`, `order_items` - Purchases, items tagged with their artist
//! - `tower_sessions.session` - Tower-sessions storage (OAuth state)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p tribal-market-cli -- migrate
//! ```

pub mod artists;
pub mod buyers;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tribal_market_core::{PriceError, ProductId};

pub use artists::ArtistRepository;
pub use buyers::BuyerRepository;
pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Not enough units in stock to fulfil a line.
    #[error("insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    /// A cart line would grow past the per-line quantity limit.
    #[error("quantity for product {product_id} cannot exceed {max} (requested {requested})")]
    LineQuantityTooLarge {
        product_id: ProductId,
        max: i32,
        requested: i32,
    },

    /// An order whose total does not fit the amount column.
    #[error("order total is too large: {0}")]
    TotalTooLarge(PriceError),
}

/// Stored amounts that no longer fit a [`Price`](tribal_market_core::Price).
impl From<PriceError> for RepositoryError {
    fn from(e: PriceError) -> Self {
        Self::DataCorruption(e.to_string())
    }
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, passing other errors through.
    pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
