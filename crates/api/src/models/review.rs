//! Product review types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribal_market_core::{BuyerId, ProductId, Rating, ReviewId};

/// A buyer's review of a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub buyer_id: BuyerId,
    pub buyer_name: String,
    pub product_id: ProductId,
    pub rating: Rating,
    pub comment: Option<String>,
    /// The buyer received this product in a delivered order.
    pub verified_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for writing or editing a review.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: Rating,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Aggregate rating figures for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
    /// Review counts for 1 to 5 stars.
    pub distribution: [i64; 5],
}

impl RatingSummary {
    /// Build the summary from `(stars, count)` pairs.
    #[must_use]
    pub fn from_counts(counts: &[(i32, i64)]) -> Self {
        let mut distribution = [0_i64; 5];
        let mut count = 0;
        let mut weighted = 0;
        for &(stars, n) in counts {
            let Some(slot) = usize::try_from(stars - 1)
                .ok()
                .and_then(|i| distribution.get_mut(i))
            else {
                continue;
            };
            *slot += n;
            count += n;
            weighted += i64::from(stars) * n;
        }

        #[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
        let average = (count > 0).then(|| {
            let avg = weighted as f64 / count as f64;
            (avg * 100.0).round() / 100.0
        });

        Self {
            average,
            count,
            distribution,
        }
    }
}

/// Reviews for a product together with the rating summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProductReviews {
    pub summary: RatingSummary,
    #[serde(flatten)]
    pub page: tribal_market_core::Page<Review>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_counts() {
        let summary = RatingSummary::from_counts(&[(5, 3), (4, 1), (1, 1)]);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.distribution, [1, 0, 0, 1, 3]);
        assert_eq!(summary.average, Some(4.0));
    }

    #[test]
    fn test_summary_empty() {
        let summary = RatingSummary::from_counts(&[]);
        assert_eq!(summary.average, None);
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn test_summary_ignores_out_of_range() {
        let summary = RatingSummary::from_counts(&[(0, 4), (6, 2), (3, 2)]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, Some(3.0));
    }

    #[test]
    fn test_summary_rounds_average() {
        let summary = RatingSummary::from_counts(&[(5, 1), (4, 2)]);
        assert_eq!(summary.average, Some(4.33));
    }
}
