//! Wishlist types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribal_market_core::{Price, ProductId, WishlistItemId};

/// A saved product with the details shown on the wishlist page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub artist_name: String,
    pub added_at: DateTime<Utc>,
}

/// Request body for adding a product to the wishlist.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToWishlist {
    pub product_id: ProductId,
}
