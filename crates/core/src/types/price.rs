//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)` and always carry two decimal places.
//! The marketplace trades in a single currency, so no currency code is kept.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount is larger than the storage column allows.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative monetary amount rounded to two decimal places.
///
/// ```
/// use rust_decimal::Decimal;
/// use tribal_market_core::Price;
///
/// let price = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(price.line_total(3).unwrap().to_string(), "59.97");
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Exclusive upper bound matching `NUMERIC(12, 2)`.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

    /// Create a price, rounding half-away-from-zero to cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero and
    /// `PriceError::TooLarge` for amounts that do not fit the column.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount >= Self::MAX {
            return Err(PriceError::TooLarge { max: Self::MAX });
        }
        Ok(Self(
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        ))
    }

    /// A zero price.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `quantity` units at this price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the total does not fit the column.
    pub fn line_total(&self, quantity: u32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::TooLarge { max: Self::MAX })
            .and_then(Self::new)
    }

    /// Add two prices.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` if the sum does not fit the column.
    pub fn checked_add(self, rhs: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(rhs.0)
            .ok_or(PriceError::TooLarge { max: Self::MAX })
            .and_then(Self::new)
    }

    /// Sum a sequence of prices.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` as soon as the running total no longer
    /// fits the column.
    pub fn checked_sum<I>(prices: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = Self>,
    {
        prices
            .into_iter()
            .try_fold(Self::zero(), Self::checked_add)
    }

    /// Whether the price is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
    }

    #[test]
    fn test_rejects_too_large() {
        assert!(matches!(
            Price::new(Decimal::new(10_000_000_000, 0)),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_rounds_to_cents() {
        let p = Price::new(Decimal::new(12_345, 3)).unwrap();
        assert_eq!(p.to_string(), "12.35");
    }

    #[test]
    fn test_line_total_and_sum() {
        let total = Price::checked_sum([price(1250).line_total(2).unwrap(), price(499)]).unwrap();
        assert_eq!(total, price(2999));
    }

    #[test]
    fn test_line_total_rejects_amounts_past_column() {
        let unit = Price::new(Decimal::new(999_999_999, 0)).unwrap();
        assert!(matches!(
            unit.line_total(20),
            Err(PriceError::TooLarge { .. })
        ));
        assert_eq!(unit.line_total(1), Ok(unit));
    }

    #[test]
    fn test_checked_sum_rejects_overflowing_total() {
        let half = Price::new(Decimal::new(6_000_000_000, 0)).unwrap();
        assert!(matches!(
            Price::checked_sum([half, half]),
            Err(PriceError::TooLarge { .. })
        ));
        assert_eq!(Price::checked_sum([]), Ok(Price::zero()));
    }

    #[test]
    fn test_display_always_two_places() {
        assert_eq!(Price::new(Decimal::new(5, 0)).unwrap().to_string(), "5.00");
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Price>("\"-3.00\"").is_err());
        let p: Price = serde_json::from_str("\"450.5\"").unwrap();
        assert_eq!(p, price(45_050));
    }
}
