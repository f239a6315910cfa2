//! Product review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use tribal_market_core::{Pagination, ProductId, ReviewId};

use crate::cache::Namespace;
use crate::db::{ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::{AuthenticatedBuyer, RequireBuyer};
use crate::models::{ProductReviews, Review, ReviewInput};
use crate::state::AppState;

/// Caches holding ratings: product listings and artist profiles.
const RATED: [Namespace; 2] = [Namespace::Products, Namespace::Artists];

/// Longest accepted review comment.
const MAX_COMMENT_LENGTH: usize = 2_000;

/// Trim the comment, dropping it when blank.
fn normalize(mut input: ReviewInput) -> Result<ReviewInput> {
    input.comment = input
        .comment
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty());

    if input
        .comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_LENGTH)
    {
        return Err(AppError::BadRequest(format!(
            "comment cannot exceed {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(input)
}

/// Load a review and check the caller wrote it.
async fn own_review(state: &AppState, buyer: AuthenticatedBuyer, id: ReviewId) -> Result<Review> {
    let review = ReviewRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {id}")))?;

    if review.buyer_id != buyer.buyer_id {
        return Err(AppError::Forbidden(
            "You can only modify your own reviews".to_string(),
        ));
    }
    Ok(review)
}

/// Reviews for an active product, newest first, with the rating summary.
///
/// # Route
///
/// `GET /api/products/{id}/reviews`
pub async fn index(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ProductReviews>> {
    ProductRepository::new(state.pool())
        .get_active(product_id)
        .await?;

    let reviews = ReviewRepository::new(state.pool());
    let summary = reviews.summary(product_id).await?;
    let page = reviews.list_for_product(product_id, pagination).await?;

    Ok(Json(ProductReviews { summary, page }))
}

/// Review a product. One review per buyer and product.
///
/// # Route
///
/// `POST /api/products/{id}/reviews`
#[instrument(skip(state, body), fields(buyer_id = %buyer.buyer_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<ProductId>,
    Json(body): Json<ReviewInput>,
) -> Result<(StatusCode, Json<Review>)> {
    let input = normalize(body)?;
    let review = ReviewRepository::new(state.pool())
        .create(buyer.buyer_id, product_id, &input)
        .await?;

    state.cache().invalidate_all(&RATED).await;
    tracing::info!(review_id = %review.id, verified = review.verified_purchase, "Review created");

    Ok((StatusCode::CREATED, Json(review)))
}

/// Edit one of the caller's reviews.
///
/// # Route
///
/// `PUT /api/reviews/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(id): Path<ReviewId>,
    Json(body): Json<ReviewInput>,
) -> Result<Json<Review>> {
    own_review(&state, buyer, id).await?;
    let input = normalize(body)?;

    let review = ReviewRepository::new(state.pool())
        .update(id, &input)
        .await?;

    state.cache().invalidate_all(&RATED).await;
    Ok(Json(review))
}

/// Delete one of the caller's reviews.
///
/// # Route
///
/// `DELETE /api/reviews/{id}`
pub async fn delete(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    own_review(&state, buyer, id).await?;

    ReviewRepository::new(state.pool()).delete(id).await?;

    state.cache().invalidate_all(&RATED).await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tribal_market_core::Rating;

    use super::*;
    use crate::cache::Cache;

    #[tokio::test]
    async fn test_review_writes_refresh_artist_ratings() {
        let cache = Cache::in_memory(Duration::from_secs(60));
        let load = |v: i32| move || async move { Ok::<_, ()>(v) };
        cache.get_or_set(Namespace::Artists, "3", load(4)).await.unwrap();
        cache.get_or_set(Namespace::Products, "9", load(4)).await.unwrap();

        cache.invalidate_all(&RATED).await;

        assert_eq!(cache.get_or_set(Namespace::Artists, "3", load(5)).await.unwrap(), 5);
        assert_eq!(cache.get_or_set(Namespace::Products, "9", load(5)).await.unwrap(), 5);
    }

    fn input(comment: Option<&str>) -> ReviewInput {
        ReviewInput {
            rating: Rating::new(5).unwrap(),
            comment: comment.map(str::to_owned),
        }
    }

    #[test]
    fn test_blank_comment_is_dropped() {
        let normalized = normalize(input(Some("   "))).unwrap();
        assert_eq!(normalized.comment, None);
    }

    #[test]
    fn test_comment_is_trimmed_and_bounded() {
        let normalized = normalize(input(Some("  Lovely brasswork  "))).unwrap();
        assert_eq!(normalized.comment.as_deref(), Some("Lovely brasswork"));

        let long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(normalize(input(Some(&long))).is_err());
    }
}
