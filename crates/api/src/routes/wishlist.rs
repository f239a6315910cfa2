//! Wishlist route handlers (buyers only).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use tribal_market_core::ProductId;

use crate::db::{RepositoryError, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireBuyer;
use crate::models::{AddToWishlist, Cart, WishlistEntry};
use crate::state::AppState;

use super::cart::{cart_error, load_cart};

/// Answer to "is this product in my wishlist?".
#[derive(Debug, Serialize)]
pub struct WishlistCheck {
    pub in_wishlist: bool,
}

/// The caller's wishlist, newest first.
///
/// # Route
///
/// `GET /api/wishlist`
pub async fn index(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
) -> Result<Json<Vec<WishlistEntry>>> {
    let entries = WishlistRepository::new(state.pool())
        .list(buyer.buyer_id)
        .await?;
    Ok(Json(entries))
}

/// Save a product.
///
/// # Route
///
/// `POST /api/wishlist`
pub async fn add(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Json(body): Json<AddToWishlist>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .add(buyer.buyer_id, body.product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not available".to_string()),
            other => AppError::Database(other),
        })?;
    Ok(StatusCode::CREATED)
}

/// Forget a product.
///
/// # Route
///
/// `DELETE /api/wishlist/{product_id}`
pub async fn remove(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    let removed = WishlistRepository::new(state.pool())
        .remove(buyer.buyer_id, product_id)
        .await?;
    if !removed {
        return Err(AppError::NotFound("Item not in wishlist".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Whether a product is saved.
///
/// # Route
///
/// `GET /api/wishlist/{product_id}/check`
pub async fn check(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistCheck>> {
    let in_wishlist = WishlistRepository::new(state.pool())
        .contains(buyer.buyer_id, product_id)
        .await?;
    Ok(Json(WishlistCheck { in_wishlist }))
}

/// Move one unit of a saved product into the cart.
///
/// # Route
///
/// `POST /api/wishlist/{product_id}/move-to-cart`
pub async fn move_to_cart(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Cart>> {
    WishlistRepository::new(state.pool())
        .move_to_cart(buyer.buyer_id, product_id)
        .await
        .map_err(cart_error)?;

    load_cart(&state, buyer).await
}
