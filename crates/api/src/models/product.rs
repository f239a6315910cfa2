//! Product catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribal_market_core::{ArtistId, CategoryId, Price, ProductId};

/// A product as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub artist_id: ArtistId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    /// Image URLs, first one is the cover image.
    pub images: Vec<String>,
    pub materials: Vec<String>,
    /// Inactive products are hidden from the storefront but kept for order history.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product joined with the names the storefront displays next to it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub artist_name: String,
    pub category_name: String,
    pub category_slug: String,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category_id: CategoryId,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
}

/// Partial product update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub category_id: Option<CategoryId>,
    pub images: Option<Vec<String>>,
    pub materials: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Storefront sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

impl ProductSort {
    /// SQL `ORDER BY` clause for this sort. Always ends with the id so that
    /// paging is stable.
    #[must_use]
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id DESC",
            Self::Rating => "average_rating DESC NULLS LAST, review_count DESC, p.id DESC",
            Self::Name => "p.name ASC, p.id ASC",
        }
    }
}

/// Catalog filters, read from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    pub artist_id: Option<ArtistId>,
    /// Case-insensitive search over name and description.
    pub q: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Trimmed search text, `None` when blank.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Stable string form used to build cache keys.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "c={}|a={}|q={}|min={}|max={}|s={:?}",
            self.category.as_deref().unwrap_or_default(),
            self.artist_id.map(|id| id.to_string()).unwrap_or_default(),
            self.search_text().unwrap_or_default().to_lowercase(),
            self.min_price.map(|p| p.to_string()).unwrap_or_default(),
            self.max_price.map(|p| p.to_string()).unwrap_or_default(),
            self.sort,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_cache_key_ignores_search_case_and_padding() {
        let a = ProductFilter {
            q: Some("  Basket ".to_string()),
            ..ProductFilter::default()
        };
        let b = ProductFilter {
            q: Some("basket".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_blank_search_is_none() {
        let f = ProductFilter {
            q: Some("   ".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(f.search_text(), None);
    }

    #[test]
    fn test_sort_parses_snake_case() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert!(sort.order_by().ends_with("p.id DESC"));
    }
}
