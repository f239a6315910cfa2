//! Order types: the buyer's view, the artist's scoped view and request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribal_market_core::{
    ArtistId, BuyerId, OrderId, OrderItemId, OrderStatus, PaymentStatus, Price, PriceError,
    ProductId,
};

use super::ShippingAddress;

/// A product line within an order, priced at the moment of purchase.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub artist_id: ArtistId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Price,
}

impl OrderItem {
    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the amount overflows.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.unit_price
            .line_total(u32::try_from(self.quantity).unwrap_or_default())
    }
}

/// A buyer's order with all of its items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub total_amount: Price,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether any line in this order is fulfilled by `artist`.
    #[must_use]
    pub fn involves_artist(&self, artist: ArtistId) -> bool {
        self.items.iter().any(|i| i.artist_id == artist)
    }

    /// Narrow the order to the lines one artist fulfils.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the artist's subtotal overflows.
    pub fn scoped_to(self, artist: ArtistId) -> Result<ArtistOrder, PriceError> {
        let items: Vec<OrderItem> = self
            .items
            .into_iter()
            .filter(|i| i.artist_id == artist)
            .collect();
        let artist_subtotal = items
            .iter()
            .map(OrderItem::line_total)
            .try_fold(Price::zero(), |acc, line| acc.checked_add(line?))?;

        Ok(ArtistOrder {
            id: self.id,
            status: self.status,
            payment_status: self.payment_status,
            shipping_address: self.shipping_address,
            notes: self.notes,
            tracking_number: self.tracking_number,
            items,
            artist_subtotal,
            created_at: self.created_at,
            updated_at: self.updated_at,
            delivered_at: self.delivered_at,
        })
    }
}

/// An order as seen by one of its artists: only their lines and subtotal.
///
/// The buyer's payment reference and the order total are withheld because
/// they cover other artists' lines.
#[derive(Debug, Clone, Serialize)]
pub struct ArtistOrder {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub items: Vec<OrderItem>,
    pub artist_subtotal: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Request bodies
// =============================================================================

/// One requested line when placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request body for placing an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub items: Vec<OrderLineInput>,
    /// Take the lines from the buyer's cart instead of `items`.
    #[serde(default)]
    pub from_cart: bool,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for an artist moving an order through fulfilment.
///
/// `status` stays a string so an unknown value is a 400 rather than a
/// deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Request body for recording a payment outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentStatus {
    pub status: String,
    #[serde(default)]
    pub reference: Option<String>,
}
