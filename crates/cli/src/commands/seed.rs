//! Seed catalog categories from a YAML file.
//!
//! ```yaml
//! - name: Dhokra Metal Craft
//!   description: Lost-wax cast brass from Bastar
//! - name: Warli Painting
//! ```
//!
//! Categories are matched by slug, so re-running the seed updates names and
//! descriptions in place.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use tribal_market_api::db::CategoryRepository;
use tribal_market_api::models::category::slugify;

use super::connect;

/// One category entry in the seed file.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parse and check a category seed file's contents.
///
/// # Errors
///
/// Returns an error for invalid YAML, blank names or duplicate slugs.
pub fn parse_categories(content: &str) -> Result<Vec<(String, CategorySeed)>, Box<dyn std::error::Error>> {
    let seeds: Vec<CategorySeed> = serde_yaml::from_str(content)?;

    let mut slugs = std::collections::HashSet::new();
    let mut parsed = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let slug = slugify(seed.name.trim());
        if slug.is_empty() {
            return Err(format!("category name {:?} has no letters or digits", seed.name).into());
        }
        if !slugs.insert(slug.clone()) {
            return Err(format!("duplicate category slug: {slug}").into());
        }
        parsed.push((slug, seed));
    }
    Ok(parsed)
}

/// Upsert categories from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// operation fails.
pub async fn categories(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading categories from file");
    let content = tokio::fs::read_to_string(path).await?;
    let parsed = parse_categories(&content)?;
    info!(count = parsed.len(), "Parsed categories");

    let pool = connect().await?;
    let repo = CategoryRepository::new(&pool);

    for (slug, seed) in &parsed {
        let category = repo
            .upsert(seed.name.trim(), slug, seed.description.as_deref())
            .await?;
        info!(id = %category.id, slug = %category.slug, "Upserted category");
    }

    info!("Seeding complete! {} categories", parsed.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_categories() {
        let parsed = parse_categories(
            "- name: Dhokra Metal Craft\n  description: Brass\n- name: Warli Painting\n",
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, "dhokra-metal-craft");
        assert_eq!(parsed[0].1.description.as_deref(), Some("Brass"));
        assert_eq!(parsed[1].1.description, None);
    }

    #[test]
    fn test_parse_categories_rejects_duplicate_slugs() {
        let result = parse_categories("- name: Gond Art\n- name: gond  art\n");
        assert!(result.is_err());
    }
}
