//! Product repository.
//!
//! Storefront reads only ever see active products. Artists see their own
//! products regardless of state, and deletion is a soft delete so that
//! historical order items keep pointing at a real row.

use sqlx::{PgPool, Postgres, QueryBuilder};

use tribal_market_core::{ArtistId, Page, Pagination, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductFilter, ProductListing, ProductUpdate};

const PRODUCT_COLUMNS: &str = "id, artist_id, category_id, name, description, price, stock, images, materials, is_active, created_at, updated_at";

const LISTING_SELECT: &str = r"
    SELECT p.id, p.artist_id, p.category_id, p.name, p.description, p.price, p.stock,
           p.images, p.materials, p.is_active, p.created_at, p.updated_at,
           a.display_name AS artist_name,
           c.name AS category_name, c.slug AS category_slug,
           r.average_rating, COALESCE(r.review_count, 0) AS review_count
    FROM products p
    JOIN artist_profiles a ON a.id = p.artist_id
    JOIN categories c ON c.id = p.category_id
    LEFT JOIN (
        SELECT product_id, AVG(rating)::float8 AS average_rating, COUNT(*) AS review_count
        FROM reviews
        GROUP BY product_id
    ) r ON r.product_id = p.id
";

const COUNT_SELECT: &str = r"
    SELECT COUNT(*)
    FROM products p
    JOIN categories c ON c.id = p.category_id
";

/// Escape `LIKE` wildcards so user search text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE p.is_active");

    if let Some(slug) = &filter.category {
        qb.push(" AND c.slug = ").push_bind(slug.clone());
    }
    if let Some(artist_id) = filter.artist_id {
        qb.push(" AND p.artist_id = ").push_bind(artist_id);
    }
    if let Some(q) = filter.search_text() {
        let pattern = format!("%{}%", escape_like(q));
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max);
    }
}

/// Repository for products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search the storefront catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<ProductListing>, RepositoryError> {
        let mut count = QueryBuilder::new(COUNT_SELECT);
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(LISTING_SELECT);
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(pagination.sql_limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let items = select
            .build_query_as::<ProductListing>()
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(items, pagination, total))
    }

    /// Get an active product with its display details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_listing(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductListing>, RepositoryError> {
        let listing = sqlx::query_as(&format!(
            "{LISTING_SELECT} WHERE p.id = $1 AND p.is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(listing)
    }

    /// Get a product whether or not it is active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Product, RepositoryError> {
        match self.get(id).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(RepositoryError::NotFound),
        }
    }

    /// Every product an artist owns, newest first, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_artist(&self, artist_id: ArtistId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE artist_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(artist_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Create a product for an artist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        artist_id: ArtistId,
        new: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as(&format!(
            r"
            INSERT INTO products (artist_id, category_id, name, description, price, stock, images, materials)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(artist_id)
        .bind(new.category_id)
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.price)
        .bind(new.stock)
        .bind(&new.images)
        .bind(&new.materials)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as(&format!(
            r"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                category_id = COALESCE($6, category_id),
                images = COALESCE($7, images),
                materials = COALESCE($8, materials),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.stock)
        .bind(update.category_id)
        .bind(update.images.as_deref())
        .bind(update.materials.as_deref())
        .bind(update.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Hide a product from the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn deactivate(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tribal_market_core::Price;

    use super::*;
    use crate::models::ProductSort;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_cotton\\"), "100\\%\\_cotton\\\\");
        assert_eq!(escape_like("dokra"), "dokra");
    }

    #[test]
    fn test_filters_only_bind_present_values() {
        let filter = ProductFilter {
            category: Some("warli".to_string()),
            min_price: Some(Price::zero()),
            sort: ProductSort::PriceAsc,
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM products p");
        push_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM products p WHERE p.is_active AND c.slug = $1 AND p.price >= $2"
        );
    }

    #[test]
    fn test_search_binds_name_and_description() {
        let filter = ProductFilter {
            q: Some("basket".to_string()),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            " WHERE p.is_active AND (p.name ILIKE $1 OR p.description ILIKE $2)"
        );
    }
}
