//! Buyer (customer) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribal_market_core::{BuyerId, UserId};

use super::ShippingAddress;

/// A buyer's profile.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerProfile {
    pub id: BuyerId,
    pub user_id: UserId,
    pub full_name: String,
    pub phone: Option<String>,
    /// Address pre-filled at checkout.
    pub shipping_address: Option<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a buyer profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBuyerProfile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}
