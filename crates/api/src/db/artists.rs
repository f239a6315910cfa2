//! Artist profile repository.

use sqlx::PgPool;

use tribal_market_core::{ArtistId, Page, Pagination, Price, UserId};

use super::RepositoryError;
use crate::models::{ArtistProfile, ArtistPublicProfile, ArtistStats, UpdateArtistProfile};

const PROFILE_COLUMNS: &str = "id, user_id, display_name, bio, tribe, region, avatar_url, phone, created_at, updated_at";

/// Public profile columns plus active product count and average rating.
const PUBLIC_SELECT: &str = r"
    SELECT a.id, a.display_name, a.bio, a.tribe, a.region, a.avatar_url,
           (SELECT COUNT(*) FROM products p WHERE p.artist_id = a.id AND p.is_active) AS product_count,
           (SELECT AVG(r.rating)::float8
              FROM reviews r JOIN products p ON p.id = r.product_id
             WHERE p.artist_id = a.id) AS average_rating,
           a.created_at AS joined_at
    FROM artist_profiles a
";

#[derive(sqlx::FromRow)]
struct StatsRow {
    product_count: i64,
    units_sold: i64,
    revenue: Price,
    pending_orders: i64,
    average_rating: Option<f64>,
}

/// Repository for artist profiles.
pub struct ArtistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArtistRepository<'a> {
    /// Create a new artist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the artist profile ID owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn id_for_user(&self, user_id: UserId) -> Result<Option<ArtistId>, RepositoryError> {
        let id = sqlx::query_scalar("SELECT id FROM artist_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(id)
    }

    /// Get an artist's own profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ArtistId) -> Result<ArtistProfile, RepositoryError> {
        sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM artist_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// List public artist profiles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(
        &self,
        pagination: Pagination,
    ) -> Result<Page<ArtistPublicProfile>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artist_profiles")
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as(&format!(
            "{PUBLIC_SELECT} ORDER BY a.created_at DESC, a.id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.sql_limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(items, pagination, total))
    }

    /// Get one artist's public profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_public(
        &self,
        id: ArtistId,
    ) -> Result<Option<ArtistPublicProfile>, RepositoryError> {
        let profile = sqlx::query_as(&format!("{PUBLIC_SELECT} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(profile)
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ArtistId,
        update: &UpdateArtistProfile,
    ) -> Result<ArtistProfile, RepositoryError> {
        sqlx::query_as(&format!(
            r"
            UPDATE artist_profiles SET
                display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                tribe = COALESCE($4, tribe),
                region = COALESCE($5, region),
                avatar_url = COALESCE($6, avatar_url),
                phone = COALESCE($7, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.display_name.as_deref())
        .bind(update.bio.as_deref())
        .bind(update.tribe.as_deref())
        .bind(update.region.as_deref())
        .bind(update.avatar_url.as_deref())
        .bind(update.phone.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Dashboard figures for an artist.
    ///
    /// Sales figures only count lines in orders that were not cancelled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, id: ArtistId) -> Result<ArtistStats, RepositoryError> {
        let row: StatsRow = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM products WHERE artist_id = $1 AND is_active) AS product_count,
                COALESCE((
                    SELECT SUM(oi.quantity)::int8
                    FROM order_items oi JOIN orders o ON o.id = oi.order_id
                    WHERE oi.artist_id = $1 AND o.status <> 'cancelled'
                ), 0) AS units_sold,
                COALESCE((
                    SELECT SUM(oi.quantity * oi.unit_price)
                    FROM order_items oi JOIN orders o ON o.id = oi.order_id
                    WHERE oi.artist_id = $1 AND o.status <> 'cancelled'
                ), 0)::numeric(12, 2) AS revenue,
                (
                    SELECT COUNT(DISTINCT o.id)
                    FROM order_items oi JOIN orders o ON o.id = oi.order_id
                    WHERE oi.artist_id = $1 AND o.status = 'pending'
                ) AS pending_orders,
                (
                    SELECT AVG(r.rating)::float8
                    FROM reviews r JOIN products p ON p.id = r.product_id
                    WHERE p.artist_id = $1
                ) AS average_rating
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(ArtistStats {
            product_count: row.product_count,
            units_sold: row.units_sold,
            revenue: row.revenue,
            pending_orders: row.pending_orders,
            average_rating: row.average_rating,
        })
    }
}
