//! Buyer profile route handlers.

use axum::{Json, extract::State};

use crate::error::{AppError, Result};
use crate::db::BuyerRepository;
use crate::middleware::RequireBuyer;
use crate::models::{BuyerProfile, UpdateBuyerProfile};
use crate::state::AppState;

/// The signed-in buyer's profile.
///
/// # Route
///
/// `GET /api/buyers/me`
pub async fn me(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
) -> Result<Json<BuyerProfile>> {
    let profile = BuyerRepository::new(state.pool()).get(buyer.buyer_id).await?;
    Ok(Json(profile))
}

/// Update the signed-in buyer's profile and default shipping address.
///
/// # Route
///
/// `PUT /api/buyers/me`
pub async fn update_me(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Json(body): Json<UpdateBuyerProfile>,
) -> Result<Json<BuyerProfile>> {
    if body.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("full_name cannot be blank".to_string()));
    }
    if let Some(address) = &body.shipping_address {
        address
            .validate()
            .map_err(|field| AppError::BadRequest(format!("shipping address is missing {field}")))?;
    }

    let profile = BuyerRepository::new(state.pool())
        .update(buyer.buyer_id, &body)
        .await?;
    Ok(Json(profile))
}
