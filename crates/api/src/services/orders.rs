//! Order placement rules that do not need the database.

use std::collections::BTreeMap;

use thiserror::Error;

use tribal_market_core::ProductId;

use crate::models::{CartLine, OrderLineInput, ShippingAddress};

/// Largest quantity of one product in a single order.
pub const MAX_LINE_QUANTITY: i32 = 1_000;

/// Reasons an order request is rejected before touching stock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderRequestError {
    #[error("order has no items")]
    Empty,

    #[error("quantity for product {product_id} must be between 1 and {MAX_LINE_QUANTITY} (got {quantity})")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("shipping address is missing {0}")]
    IncompleteAddress(&'static str),
}

/// Merge duplicate product lines and validate quantities.
///
/// The result is ordered by product ID, the order in which product rows are
/// locked.
///
/// # Errors
///
/// Returns `OrderRequestError::Empty` when there are no lines and
/// `OrderRequestError::InvalidQuantity` for a line below 1 or a merged
/// quantity above [`MAX_LINE_QUANTITY`].
pub fn merge_lines(lines: &[OrderLineInput]) -> Result<Vec<OrderLineInput>, OrderRequestError> {
    if lines.is_empty() {
        return Err(OrderRequestError::Empty);
    }

    let mut merged: BTreeMap<ProductId, i32> = BTreeMap::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(OrderRequestError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
        let total = merged.entry(line.product_id).or_insert(0);
        *total = total.saturating_add(line.quantity);
    }

    merged
        .into_iter()
        .map(|(product_id, quantity)| {
            if quantity > MAX_LINE_QUANTITY {
                Err(OrderRequestError::InvalidQuantity {
                    product_id,
                    quantity,
                })
            } else {
                Ok(OrderLineInput {
                    product_id,
                    quantity,
                })
            }
        })
        .collect()
}

/// Order lines for a checkout from the cart.
#[must_use]
pub fn lines_from_cart(cart: &[CartLine]) -> Vec<OrderLineInput> {
    cart.iter()
        .map(|l| OrderLineInput {
            product_id: l.product_id,
            quantity: l.quantity,
        })
        .collect()
}

/// Check a shipping address has every required field.
///
/// # Errors
///
/// Returns `OrderRequestError::IncompleteAddress` naming the first blank field.
pub fn validate_address(address: &ShippingAddress) -> Result<(), OrderRequestError> {
    address
        .validate()
        .map_err(OrderRequestError::IncompleteAddress)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: i32, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: ProductId::new(product),
            quantity,
        }
    }

    #[test]
    fn test_merges_duplicates_sorted_by_product() {
        let merged = merge_lines(&[line(9, 1), line(3, 2), line(9, 4)]).unwrap();
        let pairs: Vec<(i32, i32)> = merged
            .iter()
            .map(|l| (l.product_id.as_i32(), l.quantity))
            .collect();
        assert_eq!(pairs, vec![(3, 2), (9, 5)]);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(merge_lines(&[]), Err(OrderRequestError::Empty));
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert_eq!(
            merge_lines(&[line(1, 2), line(2, 0)]),
            Err(OrderRequestError::InvalidQuantity {
                product_id: ProductId::new(2),
                quantity: 0
            })
        );
        assert!(merge_lines(&[line(1, -3)]).is_err());
    }

    #[test]
    fn test_rejects_oversized_merged_line() {
        let err = merge_lines(&[line(1, MAX_LINE_QUANTITY), line(1, 1)]).unwrap_err();
        assert!(matches!(err, OrderRequestError::InvalidQuantity { .. }));
    }
}
