//! Cart route handlers (buyers only).
//!
//! Quantities are checked against current stock on every write. Asking for
//! more than is in stock is a bad request here; at checkout it is a conflict.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use tribal_market_core::ProductId;

use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{AuthenticatedBuyer, RequireBuyer};
use crate::models::{AddToCart, Cart, SetQuantity};
use crate::services::orders::MAX_LINE_QUANTITY;
use crate::state::AppState;

/// Map cart write failures to responses.
pub(crate) fn cart_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::InsufficientStock { .. } => AppError::BadRequest(err.to_string()),
        RepositoryError::NotFound => AppError::NotFound("Product not available".to_string()),
        other => AppError::Database(other),
    }
}

fn check_quantity(quantity: i32) -> Result<()> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )))
    }
}

pub(crate) async fn load_cart(state: &AppState, buyer: AuthenticatedBuyer) -> Result<Json<Cart>> {
    let lines = CartRepository::new(state.pool()).lines(buyer.buyer_id).await?;
    let cart = Cart::from_lines(lines).map_err(RepositoryError::TotalTooLarge)?;
    Ok(Json(cart))
}

/// The caller's cart.
///
/// # Route
///
/// `GET /api/cart`
pub async fn show(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
) -> Result<Json<Cart>> {
    load_cart(&state, buyer).await
}

/// Add a product, or more of it, to the cart.
///
/// # Route
///
/// `POST /api/cart/items`
pub async fn add(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Json(body): Json<AddToCart>,
) -> Result<Json<Cart>> {
    check_quantity(body.quantity)?;

    CartRepository::new(state.pool())
        .add(buyer.buyer_id, body.product_id, body.quantity)
        .await
        .map_err(cart_error)?;

    load_cart(&state, buyer).await
}

/// Set a line's quantity. Zero removes the line.
///
/// # Route
///
/// `PUT /api/cart/items/{product_id}`
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<ProductId>,
    Json(body): Json<SetQuantity>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool());

    if body.quantity == 0 {
        cart.remove(buyer.buyer_id, product_id).await?;
    } else {
        check_quantity(body.quantity)?;
        cart.set_quantity(buyer.buyer_id, product_id, body.quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound("Item not in cart".to_string()),
                other => cart_error(other),
            })?;
    }

    load_cart(&state, buyer).await
}

/// Remove a line.
///
/// # Route
///
/// `DELETE /api/cart/items/{product_id}`
pub async fn remove(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Cart>> {
    let removed = CartRepository::new(state.pool())
        .remove(buyer.buyer_id, product_id)
        .await?;
    if !removed {
        return Err(AppError::NotFound("Item not in cart".to_string()));
    }

    load_cart(&state, buyer).await
}

/// Empty the cart.
///
/// # Route
///
/// `DELETE /api/cart`
pub async fn clear(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
) -> Result<StatusCode> {
    CartRepository::new(state.pool()).clear(buyer.buyer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn test_insufficient_stock_is_bad_request() {
        let err = cart_error(RepositoryError::InsufficientStock {
            product_id: ProductId::new(4),
            available: 1,
            requested: 3,
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_line_limit_is_bad_request() {
        let err = cart_error(RepositoryError::LineQuantityTooLarge {
            product_id: ProductId::new(4),
            max: MAX_LINE_QUANTITY,
            requested: MAX_LINE_QUANTITY + 1,
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_check_quantity_bounds() {
        assert!(check_quantity(1).is_ok());
        assert!(check_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(check_quantity(0).is_err());
        assert!(check_quantity(-2).is_err());
    }
}
