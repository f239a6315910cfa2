//! Order route handlers.
//!
//! Buyers place, list, cancel and pay for their orders. Artists see and
//! advance orders that contain their items, scoped to those items.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use tribal_market_core::{OrderId, OrderStatus, Page, Pagination, PaymentStatus, UserRole};

use crate::cache::Namespace;
use crate::db::orders::NewOrder;
use crate::db::{
    ArtistRepository, BuyerRepository, CartRepository, OrderRepository, RepositoryError,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{AuthenticatedBuyer, RequireArtist, RequireAuth, RequireBuyer};
use crate::models::{ArtistOrder, CreateOrder, Order, UpdateOrderStatus, UpdatePaymentStatus};
use crate::services::orders::{lines_from_cart, merge_lines, validate_address};
use crate::state::AppState;

/// Longest accepted order note.
const MAX_NOTES_LENGTH: usize = 1_000;

/// Longest accepted tracking number.
const MAX_TRACKING_LENGTH: usize = 100;

/// An order as the caller is allowed to see it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OrderView {
    Buyer(Order),
    Artist(ArtistOrder),
}

fn order_not_found(id: OrderId) -> AppError {
    AppError::NotFound(format!("order {id}"))
}

/// Trimmed optional text, `None` when blank, bounded in length.
fn optional_text(value: Option<&str>, field: &str, max: usize) -> Result<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(Some(value.to_owned()))
}

/// Load an order that belongs to the calling buyer.
async fn buyer_order(state: &AppState, buyer: AuthenticatedBuyer, id: OrderId) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|order| order.buyer_id == buyer.buyer_id)
        .ok_or_else(|| order_not_found(id))
}

/// Place an order from explicit lines or from the cart.
///
/// # Route
///
/// `POST /api/orders`
#[instrument(skip(state, body), fields(buyer_id = %buyer.buyer_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Json(body): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    validate_address(&body.shipping_address)?;
    let notes = optional_text(body.notes.as_deref(), "notes", MAX_NOTES_LENGTH)?;

    let requested = if body.from_cart {
        if !body.items.is_empty() {
            return Err(AppError::BadRequest(
                "send either items or from_cart, not both".to_string(),
            ));
        }
        let cart = CartRepository::new(state.pool()).lines(buyer.buyer_id).await?;
        lines_from_cart(&cart)
    } else {
        body.items
    };
    let lines = merge_lines(&requested)?;

    let order = OrderRepository::new(state.pool())
        .create(NewOrder {
            buyer_id: buyer.buyer_id,
            lines: &lines,
            shipping_address: &body.shipping_address,
            notes: notes.as_deref(),
            clear_cart: body.from_cart,
        })
        .await?;

    // Stock changed.
    state.cache().invalidate(Namespace::Products).await;

    let order_id = order.id.to_string();
    add_breadcrumb("orders", "Order placed", Some(&[("order_id", order_id.as_str())]));
    tracing::info!(order_id = %order.id, total = %order.total_amount, "Order placed");

    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first.
///
/// # Route
///
/// `GET /api/orders`
pub async fn index(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_buyer(buyer.buyer_id, pagination)
        .await?;
    Ok(Json(orders))
}

/// One order, for its buyer or for an artist with items in it.
///
/// # Route
///
/// `GET /api/orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let user_id = auth.user_id()?;
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| order_not_found(id))?;

    let view = match auth.0.role {
        UserRole::Buyer => {
            let buyer_id = BuyerRepository::new(state.pool()).id_for_user(user_id).await?;
            (buyer_id == Some(order.buyer_id)).then_some(OrderView::Buyer(order))
        }
        UserRole::Artist => {
            let artist_id = ArtistRepository::new(state.pool()).id_for_user(user_id).await?;
            artist_id
                .filter(|artist| order.involves_artist(*artist))
                .map(|artist| order.scoped_to(artist).map(OrderView::Artist))
                .transpose()
                .map_err(RepositoryError::from)?
        }
    };

    view.map(Json).ok_or_else(|| order_not_found(id))
}

/// Cancel one of the caller's orders and restock its items.
///
/// # Route
///
/// `POST /api/orders/{id}/cancel`
#[instrument(skip(state), fields(buyer_id = %buyer.buyer_id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = buyer_order(&state, buyer, id).await?;
    if !order.status.is_cancellable() {
        return Err(AppError::Conflict(format!(
            "a {} order cannot be cancelled",
            order.status
        )));
    }

    let order = OrderRepository::new(state.pool())
        .update_status(id, OrderStatus::Cancelled, None)
        .await?;

    state.cache().invalidate(Namespace::Products).await;
    tracing::info!(order_id = %id, "Order cancelled by buyer");

    Ok(Json(order))
}

/// Advance an order's fulfilment status.
///
/// # Route
///
/// `PATCH /api/orders/{id}/status`
#[instrument(skip(state, body), fields(artist_id = %artist.artist_id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateOrderStatus>,
) -> Result<Json<ArtistOrder>> {
    let next = body
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let tracking = optional_text(
        body.tracking_number.as_deref(),
        "tracking_number",
        MAX_TRACKING_LENGTH,
    )?;

    let orders = OrderRepository::new(state.pool());
    let involved = orders
        .get(id)
        .await?
        .is_some_and(|order| order.involves_artist(artist.artist_id));
    if !involved {
        return Err(order_not_found(id));
    }

    let order = orders
        .update_status(id, next, tracking.as_deref())
        .await?;

    if next == OrderStatus::Cancelled {
        state.cache().invalidate(Namespace::Products).await;
    }
    tracing::info!(order_id = %id, status = %next, "Order status updated");

    let scoped = order
        .scoped_to(artist.artist_id)
        .map_err(RepositoryError::from)?;
    Ok(Json(scoped))
}

/// Record a payment outcome for one of the caller's orders.
///
/// # Route
///
/// `PATCH /api/orders/{id}/payment`
#[instrument(skip(state, body), fields(buyer_id = %buyer.buyer_id, status = %body.status))]
pub async fn update_payment(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdatePaymentStatus>,
) -> Result<Json<Order>> {
    let next = body
        .status
        .parse::<PaymentStatus>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let reference = optional_text(body.reference.as_deref(), "reference", MAX_TRACKING_LENGTH)?;

    buyer_order(&state, buyer, id).await?;

    let order = OrderRepository::new(state.pool())
        .update_payment(id, next, reference.as_deref())
        .await?;

    tracing::info!(order_id = %id, payment_status = %next, "Payment status updated");
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None, "notes", 10).unwrap(), None);
        assert_eq!(optional_text(Some("   "), "notes", 10).unwrap(), None);
        assert_eq!(
            optional_text(Some(" leave at door "), "notes", 20).unwrap(),
            Some("leave at door".to_string())
        );
        assert!(optional_text(Some("far too long"), "notes", 3).is_err());
    }
}
