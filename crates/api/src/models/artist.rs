//! Artist (seller) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribal_market_core::{ArtistId, Price, UserId};

/// An artist's own profile, as shown in the artist portal.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ArtistProfile {
    pub id: ArtistId,
    pub user_id: UserId,
    pub display_name: String,
    pub bio: Option<String>,
    /// Community or tribe the artist belongs to.
    pub tribe: Option<String>,
    pub region: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public face of an artist on the storefront.
///
/// Contact details are left out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArtistPublicProfile {
    pub id: ArtistId,
    pub display_name: String,
    pub bio: Option<String>,
    pub tribe: Option<String>,
    pub region: Option<String>,
    pub avatar_url: Option<String>,
    /// Number of active products.
    pub product_count: i64,
    /// Average rating across all of the artist's products.
    pub average_rating: Option<f64>,
    pub joined_at: DateTime<Utc>,
}

/// Partial update of an artist profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArtistProfile {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub tribe: Option<String>,
    pub region: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
}

/// Dashboard figures for the artist portal.
#[derive(Debug, Clone, Serialize)]
pub struct ArtistStats {
    /// Active products.
    pub product_count: i64,
    /// Units sold across non-cancelled orders.
    pub units_sold: i64,
    /// Revenue across non-cancelled orders.
    pub revenue: Price,
    /// Orders with this artist's items still waiting for confirmation.
    pub pending_orders: i64,
    /// Average rating across the artist's products.
    pub average_rating: Option<f64>,
}
