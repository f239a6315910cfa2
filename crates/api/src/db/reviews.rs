//! Review repository.

use sqlx::PgPool;

use tribal_market_core::{BuyerId, Page, Pagination, ProductId, ReviewId};

use super::RepositoryError;
use crate::models::{RatingSummary, Review, ReviewInput};

/// Review columns, read from a relation aliased `r`, with the author's name.
const REVIEW_SELECT: &str = r"
    SELECT r.id, r.buyer_id, b.full_name AS buyer_name, r.product_id, r.rating,
           r.comment, r.verified_purchase, r.created_at, r.updated_at
";

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        pagination: Pagination,
    ) -> Result<Page<Review>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as(&format!(
            r"
            {REVIEW_SELECT}
            FROM reviews r JOIN buyer_profiles b ON b.id = r.buyer_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(product_id)
        .bind(pagination.sql_limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, pagination, total))
    }

    /// Rating counts for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, product_id: ProductId) -> Result<RatingSummary, RepositoryError> {
        let counts: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT rating, COUNT(*) FROM reviews WHERE product_id = $1 GROUP BY rating",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(RatingSummary::from_counts(&counts))
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as(&format!(
            r"
            {REVIEW_SELECT}
            FROM reviews r JOIN buyer_profiles b ON b.id = r.buyer_id
            WHERE r.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(review)
    }

    /// Write a buyer's review of an active product.
    ///
    /// The review is marked as a verified purchase when the buyer has a
    /// delivered order containing the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    /// Returns `RepositoryError::Conflict` if the buyer already reviewed it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        sqlx::query_as(&format!(
            r"
            WITH r AS (
                INSERT INTO reviews (buyer_id, product_id, rating, comment, verified_purchase)
                SELECT $1, p.id, $3, $4, EXISTS (
                    SELECT 1
                    FROM orders o JOIN order_items oi ON oi.order_id = o.id
                    WHERE o.buyer_id = $1 AND oi.product_id = p.id AND o.status = 'delivered'
                )
                FROM products p
                WHERE p.id = $2 AND p.is_active
                RETURNING *
            )
            {REVIEW_SELECT}
            FROM r JOIN buyer_profiles b ON b.id = r.buyer_id
            "
        ))
        .bind(buyer_id)
        .bind(product_id)
        .bind(input.rating)
        .bind(input.comment.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "product already reviewed"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Replace a review's rating and comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(&self, id: ReviewId, input: &ReviewInput) -> Result<Review, RepositoryError> {
        sqlx::query_as(&format!(
            r"
            WITH r AS (
                UPDATE reviews SET rating = $2, comment = $3, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {REVIEW_SELECT}
            FROM r JOIN buyer_profiles b ON b.id = r.buyer_id
            "
        ))
        .bind(id)
        .bind(input.rating)
        .bind(input.comment.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
