//! Wishlist repository.

use sqlx::PgPool;

use tribal_market_core::{BuyerId, ProductId};

use super::{RepositoryError, cart};
use crate::models::WishlistEntry;

/// Repository for buyers' wishlists.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every saved product, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, buyer_id: BuyerId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let entries = sqlx::query_as(
            r"
            SELECT w.id, w.product_id, p.name, p.price, p.images[1] AS image, p.stock,
                   p.is_active, a.display_name AS artist_name, w.created_at AS added_at
            FROM wishlist_items w
            JOIN products p ON p.id = w.product_id
            JOIN artist_profiles a ON a.id = p.artist_id
            WHERE w.buyer_id = $1
            ORDER BY w.created_at DESC, w.id DESC
            ",
        )
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Save an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    /// Returns `RepositoryError::Conflict` if it is already saved.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(&self, buyer_id: BuyerId, product_id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO wishlist_items (buyer_id, product_id)
            SELECT $1, id FROM products WHERE id = $2 AND is_active
            ",
        )
        .bind(buyer_id)
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "product already in wishlist"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove a saved product. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM wishlist_items WHERE buyer_id = $1 AND product_id = $2")
                .bind(buyer_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a product is saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let found = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM wishlist_items WHERE buyer_id = $1 AND product_id = $2)",
        )
        .bind(buyer_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(found)
    }

    /// Move a saved product into the cart as one more unit.
    ///
    /// Returns the cart line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the
    /// wishlist or is no longer active.
    /// Returns `RepositoryError::InsufficientStock` if no unit is left to add.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn move_to_cart(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<i32, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed =
            sqlx::query("DELETE FROM wishlist_items WHERE buyer_id = $1 AND product_id = $2")
                .bind(buyer_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        if removed.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let quantity = cart::add_in_tx(&mut tx, buyer_id, product_id, 1).await?;

        tx.commit().await?;
        Ok(quantity)
    }
}
