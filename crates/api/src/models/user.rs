//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tribal_market_core::{Email, UserId, UserRole};

/// A marketplace account (domain type).
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email address.
    pub email: Email,
    /// Display name given at registration.
    pub name: String,
    /// Buyer or artist.
    pub role: UserRole,
    /// Whether a Google account is linked.
    pub google_linked: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
