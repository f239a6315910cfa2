//! Cart repository.
//!
//! Quantities are checked against live stock when written. Stock is not
//! reserved; order placement re-checks it under a row lock.

use sqlx::{PgConnection, PgPool};

use tribal_market_core::{BuyerId, ProductId};

use super::RepositoryError;
use crate::models::CartLine;
use crate::services::orders::MAX_LINE_QUANTITY;

#[derive(sqlx::FromRow)]
struct StockRow {
    stock: i32,
    is_active: bool,
}

/// Lock an active product's row and return its stock.
async fn lock_stock(conn: &mut PgConnection, product_id: ProductId) -> Result<i32, RepositoryError> {
    let row: Option<StockRow> =
        sqlx::query_as("SELECT stock, is_active FROM products WHERE id = $1 FOR SHARE")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    match row {
        Some(r) if r.is_active => Ok(r.stock),
        _ => Err(RepositoryError::NotFound),
    }
}

/// Quantity of a line after adding `adding` units to `existing`.
///
/// The result must fit both current stock and the per-line limit that
/// checkout enforces.
fn next_quantity(
    product_id: ProductId,
    existing: Option<i32>,
    adding: i32,
    stock: i32,
) -> Result<i32, RepositoryError> {
    let requested = existing.unwrap_or(0).saturating_add(adding);
    if requested > MAX_LINE_QUANTITY {
        return Err(RepositoryError::LineQuantityTooLarge {
            product_id,
            max: MAX_LINE_QUANTITY,
            requested,
        });
    }
    if requested > stock {
        return Err(RepositoryError::InsufficientStock {
            product_id,
            available: stock,
            requested,
        });
    }
    Ok(requested)
}

/// Add `quantity` units to a cart line, creating it if needed.
///
/// Returns the line's new quantity.
pub(crate) async fn add_in_tx(
    conn: &mut PgConnection,
    buyer_id: BuyerId,
    product_id: ProductId,
    quantity: i32,
) -> Result<i32, RepositoryError> {
    let stock = lock_stock(conn, product_id).await?;

    let existing: Option<i32> = sqlx::query_scalar(
        "SELECT quantity FROM cart_items WHERE buyer_id = $1 AND product_id = $2 FOR UPDATE",
    )
    .bind(buyer_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let requested = next_quantity(product_id, existing, quantity, stock)?;

    sqlx::query(
        r"
        INSERT INTO cart_items (buyer_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (buyer_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
        ",
    )
    .bind(buyer_id)
    .bind(product_id)
    .bind(requested)
    .execute(&mut *conn)
    .await?;

    Ok(requested)
}

/// Repository for buyers' carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every line in a buyer's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, buyer_id: BuyerId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as(
            r"
            SELECT ci.product_id, p.name, p.price, ci.quantity, p.stock,
                   p.images[1] AS image, p.artist_id, a.display_name AS artist_name,
                   p.is_active
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            JOIN artist_profiles a ON a.id = p.artist_id
            WHERE ci.buyer_id = $1
            ORDER BY ci.created_at, ci.id
            ",
        )
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add units of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    /// Returns `RepositoryError::InsufficientStock` if the resulting quantity exceeds stock.
    /// Returns `RepositoryError::LineQuantityTooLarge` if it exceeds the line limit.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let quantity = add_in_tx(&mut tx, buyer_id, product_id, quantity).await?;
        tx.commit().await?;
        Ok(quantity)
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or the
    /// product is no longer active.
    /// Returns `RepositoryError::InsufficientStock` if `quantity` exceeds stock.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_quantity(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock = lock_stock(&mut tx, product_id).await?;
        if quantity > stock {
            return Err(RepositoryError::InsufficientStock {
                product_id,
                available: stock,
                requested: quantity,
            });
        }

        let result = sqlx::query(
            r"
            UPDATE cart_items SET quantity = $3, updated_at = NOW()
            WHERE buyer_id = $1 AND product_id = $2
            ",
        )
        .bind(buyer_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove one line. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1 AND product_id = $2")
            .bind(buyer_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, buyer_id: BuyerId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1")
            .bind(buyer_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RUG: ProductId = ProductId::new(4);

    #[test]
    fn test_next_quantity_increments_existing_line() {
        assert!(matches!(next_quantity(RUG, Some(2), 3, 5), Ok(5)));
        assert!(matches!(next_quantity(RUG, None, 1, 5), Ok(1)));
    }

    #[test]
    fn test_next_quantity_rejects_past_stock() {
        assert!(matches!(
            next_quantity(RUG, Some(4), 2, 5),
            Err(RepositoryError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_next_quantity_caps_line_even_with_stock() {
        let err = next_quantity(RUG, Some(MAX_LINE_QUANTITY), 1, i32::MAX).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::LineQuantityTooLarge { requested, .. } if requested == MAX_LINE_QUANTITY + 1
        ));
    }
}
