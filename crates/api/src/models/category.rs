//! Product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tribal_market_core::CategoryId;

/// A catalog category such as "Dhokra Metal Craft" or "Warli Painting".
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL-safe identifier derived from the name.
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Derive a URL slug from a category name.
///
/// Lower-cases ASCII letters and digits and collapses every other run of
/// characters into a single `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Dhokra Metal Craft"), "dhokra-metal-craft");
        assert_eq!(slugify("  Bamboo & Cane -- Work "), "bamboo-cane-work");
        assert_eq!(slugify("Pattachitra"), "pattachitra");
    }

    #[test]
    fn test_slugify_non_ascii_only() {
        assert_eq!(slugify("☆ ★"), "");
    }
}
