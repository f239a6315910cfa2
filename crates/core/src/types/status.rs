//! Status enums and lifecycle rules.
//!
//! Order lifecycle:
//!
//! ```text
//! pending ──> confirmed ──> shipped ──> delivered
//!    │            │
//!    └────────────┴──> cancelled
//! ```
//!
//! Payment lifecycle:
//!
//! ```text
//! pending ──> paid ──> refunded
//!    │         ▲
//!    └──> failed
//! ```

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status string fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct StatusParseError {
    /// Which status family was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Error returned when a status change is not allowed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot change {kind} from {from} to {to}")]
pub struct TransitionError {
    /// Which status family was being changed.
    pub kind: &'static str,
    /// Current status.
    pub from: &'static str,
    /// Requested status.
    pub to: &'static str,
}

/// Marketplace account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Customer account: places orders, keeps a cart, wishlist and reviews.
    Buyer,
    /// Seller account: owns products and fulfils order items.
    Artist,
}

impl UserRole {
    /// Lower-case string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Artist => "artist",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "artist" => Ok(Self::Artist),
            _ => Err(StatusParseError {
                kind: "role",
                value: s.to_owned(),
            }),
        }
    }
}

/// Order fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Lower-case string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether an order in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }

    /// Validate a transition, returning a descriptive error when illegal.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if `next` is not reachable from `self`.
    pub const fn transition_to(&self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                kind: "order status",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the order can still be cancelled (stock not yet shipped).
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.can_transition_to(Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError {
                kind: "order status",
                value: s.to_owned(),
            })
    }
}

/// Order payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Every status.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    /// Lower-case string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether a payment in this status may move to `next`.
    ///
    /// A failed payment may be retried; refunds only follow a capture.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Failed)
                | (Self::Failed, Self::Paid)
                | (Self::Paid, Self::Refunded)
        )
    }

    /// Validate a transition, returning a descriptive error when illegal.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if `next` is not reachable from `self`.
    pub const fn transition_to(&self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                kind: "payment status",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Payment status an order ends up in when it is cancelled.
    #[must_use]
    pub const fn after_cancellation(&self) -> Self {
        match self {
            Self::Paid => Self::Refunded,
            other => *other,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError {
                kind: "payment status",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_happy_path() {
        let status = OrderStatus::Pending
            .transition_to(OrderStatus::Confirmed)
            .and_then(|s| s.transition_to(OrderStatus::Shipped))
            .and_then(|s| s.transition_to(OrderStatus::Delivered))
            .unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn test_order_cannot_skip_or_go_back() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_cancellable_only_before_shipping() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_transition_error_message() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot change order status from delivered to pending"
        );
    }

    #[test]
    fn test_order_status_parse() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        let err = "SHIPPED".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "order status");
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Failed.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Paid));
    }

    #[test]
    fn test_payment_after_cancellation() {
        assert_eq!(
            PaymentStatus::Paid.after_cancellation(),
            PaymentStatus::Refunded
        );
        assert_eq!(
            PaymentStatus::Pending.after_cancellation(),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::from_str::<UserRole>("\"artist\"").unwrap(),
            UserRole::Artist
        );
    }
}
