//! Shopping cart types.

use serde::{Deserialize, Serialize};

use tribal_market_core::{ArtistId, Price, PriceError, ProductId};

/// One product line in a buyer's cart, with a live product snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: i32,
    /// Units currently in stock.
    pub stock: i32,
    pub image: Option<String>,
    pub artist_id: ArtistId,
    pub artist_name: String,
    /// False when the artist has since removed the product.
    pub is_active: bool,
}

impl CartLine {
    /// Price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the amount overflows.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.price
            .line_total(u32::try_from(self.quantity).unwrap_or_default())
    }

    /// Whether the line can be checked out as-is.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_active && self.quantity <= self.stock
    }
}

/// A cart line as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Price,
    pub purchasable: bool,
}

/// A buyer's cart with totals.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub items: Vec<CartLineView>,
    /// Sum over purchasable lines only.
    pub subtotal: Price,
    pub item_count: i64,
}

impl Cart {
    /// Build a cart view from its lines.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if a line total or the subtotal no
    /// longer fits an order amount.
    pub fn from_lines(lines: Vec<CartLine>) -> Result<Self, PriceError> {
        let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let items = lines
            .into_iter()
            .map(|line| {
                Ok(CartLineView {
                    line_total: line.line_total()?,
                    purchasable: line.is_purchasable(),
                    line,
                })
            })
            .collect::<Result<Vec<_>, PriceError>>()?;
        let subtotal = Price::checked_sum(
            items
                .iter()
                .filter(|view| view.purchasable)
                .map(|view| view.line_total),
        )?;

        Ok(Self {
            items,
            subtotal,
            item_count,
        })
    }
}

/// Request body for adding a product to the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Request body for setting a cart line's quantity.
#[derive(Debug, Clone, Deserialize)]
pub struct SetQuantity {
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(cents: i64, quantity: i32, stock: i32, is_active: bool) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            name: "Gond painting".to_string(),
            price: Price::new(Decimal::new(cents, 2)).unwrap(),
            quantity,
            stock,
            image: None,
            artist_id: ArtistId::new(1),
            artist_name: "Bhajju".to_string(),
            is_active,
        }
    }

    #[test]
    fn test_subtotal_skips_unpurchasable_lines() {
        let cart = Cart::from_lines(vec![
            line(1000, 2, 5, true),
            line(500, 1, 0, true),
            line(700, 1, 3, false),
        ])
        .unwrap();
        assert_eq!(cart.subtotal.to_string(), "20.00");
        assert_eq!(cart.item_count, 4);
        assert!(!cart.items[1].purchasable);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::from_lines(vec![]).unwrap();
        assert!(cart.subtotal.is_zero());
        assert_eq!(cart.item_count, 0);
    }

    #[test]
    fn test_subtotal_past_order_limit_is_an_error() {
        let result = Cart::from_lines(vec![
            line(600_000_000_000, 1, 5, true),
            line(600_000_000_000, 1, 5, true),
        ]);
        assert!(matches!(result, Err(PriceError::TooLarge { .. })));
    }
}
