//! Category repository.

use sqlx::PgPool;

use tribal_market_core::CategoryId;

use super::RepositoryError;
use crate::models::Category;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at";

/// Repository for catalog categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every category by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Whether a category exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Ok(exists)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as(&format!(
            r"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "category already exists"))
    }

    /// Create a category or refresh the name and description of an existing slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as(&format!(
            r"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE
                SET name = EXCLUDED.name, description = EXCLUDED.description
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }
}
