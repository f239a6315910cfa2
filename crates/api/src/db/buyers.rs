//! Buyer profile repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use tribal_market_core::{BuyerId, UserId};

use super::RepositoryError;
use crate::models::{BuyerProfile, ShippingAddress, UpdateBuyerProfile};

#[derive(sqlx::FromRow)]
struct BuyerRow {
    id: BuyerId,
    user_id: UserId,
    full_name: String,
    phone: Option<String>,
    shipping_address: Option<Json<ShippingAddress>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BuyerRow> for BuyerProfile {
    fn from(r: BuyerRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            full_name: r.full_name,
            phone: r.phone,
            shipping_address: r.shipping_address.map(|Json(a)| a),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const BUYER_COLUMNS: &str =
    "id, user_id, full_name, phone, shipping_address, created_at, updated_at";

/// Repository for buyer profiles.
pub struct BuyerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BuyerRepository<'a> {
    /// Create a new buyer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the buyer profile ID owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn id_for_user(&self, user_id: UserId) -> Result<Option<BuyerId>, RepositoryError> {
        let id = sqlx::query_scalar("SELECT id FROM buyer_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(id)
    }

    /// Get a buyer's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BuyerId) -> Result<BuyerProfile, RepositoryError> {
        let row: BuyerRow = sqlx::query_as(&format!(
            "SELECT {BUYER_COLUMNS} FROM buyer_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: BuyerId,
        update: &UpdateBuyerProfile,
    ) -> Result<BuyerProfile, RepositoryError> {
        let row: BuyerRow = sqlx::query_as(&format!(
            r"
            UPDATE buyer_profiles SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                shipping_address = COALESCE($4, shipping_address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BUYER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.full_name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.shipping_address.as_ref().map(Json))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
