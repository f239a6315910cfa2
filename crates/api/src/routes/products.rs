//! Product catalog route handlers.
//!
//! Reads are public and cached; writes are restricted to the owning artist
//! and invalidate the catalog caches.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use tribal_market_core::{CategoryId, Page, Pagination, ProductId};

use crate::cache::Namespace;
use crate::db::{CategoryRepository, ProductRepository, RepositoryError, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::{AuthenticatedArtist, RequireArtist};
use crate::models::{
    NewProduct, Product, ProductFilter, ProductListing, ProductUpdate, RatingSummary,
};
use crate::state::AppState;

/// Longest accepted product name.
const MAX_NAME_LENGTH: usize = 200;

/// Most images a product may carry.
const MAX_IMAGES: usize = 10;

/// Namespaces a product write makes stale.
const CATALOG: [Namespace; 3] = [Namespace::Products, Namespace::Categories, Namespace::Artists];

/// Product detail page payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub listing: ProductListing,
    pub rating: RatingSummary,
}

// =============================================================================
// Validation
// =============================================================================

fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be 1 to {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".to_string()));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> Result<()> {
    if images.len() > MAX_IMAGES {
        return Err(AppError::BadRequest(format!(
            "a product can have at most {MAX_IMAGES} images"
        )));
    }
    for image in images {
        let valid = Url::parse(image).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
        if !valid {
            return Err(AppError::BadRequest(format!("invalid image URL: {image}")));
        }
    }
    Ok(())
}

async fn ensure_category(state: &AppState, id: CategoryId) -> Result<()> {
    if CategoryRepository::new(state.pool()).exists(id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("unknown category {id}")))
    }
}

/// Load a product and check the caller owns it.
async fn owned_product(
    state: &AppState,
    artist: AuthenticatedArtist,
    id: ProductId,
) -> Result<Product> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    if product.artist_id != artist.artist_id {
        return Err(AppError::Forbidden(
            "You can only modify your own products".to_string(),
        ));
    }
    Ok(product)
}

// =============================================================================
// Handlers
// =============================================================================

/// Search the active catalog.
///
/// # Route
///
/// `GET /api/products`
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<ProductListing>>> {
    if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
        && min > max
    {
        return Err(AppError::BadRequest(
            "min_price cannot exceed max_price".to_string(),
        ));
    }

    let suffix = format!(
        "list:{}:{}:{}",
        filter.cache_key(),
        pagination.page(),
        pagination.limit()
    );
    let page = state
        .cache()
        .get_or_set(Namespace::Products, &suffix, || async {
            ProductRepository::new(state.pool())
                .search(&filter, pagination)
                .await
        })
        .await?;

    Ok(Json(page))
}

/// One active product with its rating summary.
///
/// # Route
///
/// `GET /api/products/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let detail = state
        .cache()
        .get_or_set(Namespace::Products, &format!("id:{id}"), || async {
            let listing = ProductRepository::new(state.pool())
                .get_listing(id)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            let rating = ReviewRepository::new(state.pool()).summary(id).await?;
            Ok::<_, RepositoryError>(ProductDetail { listing, rating })
        })
        .await?;

    Ok(Json(detail))
}

/// List a new product.
///
/// # Route
///
/// `POST /api/products`
#[instrument(skip(state, body), fields(artist_id = %artist.artist_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_name(&body.name)?;
    validate_stock(body.stock)?;
    validate_images(&body.images)?;
    ensure_category(&state, body.category_id).await?;

    let product = ProductRepository::new(state.pool())
        .create(artist.artist_id, &body)
        .await?;

    state.cache().invalidate_all(&CATALOG).await;
    tracing::info!(product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update one of the caller's products.
///
/// # Route
///
/// `PUT /api/products/{id}`
#[instrument(skip(state, body), fields(artist_id = %artist.artist_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    owned_product(&state, artist, id).await?;

    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    if let Some(stock) = body.stock {
        validate_stock(stock)?;
    }
    if let Some(images) = &body.images {
        validate_images(images)?;
    }
    if let Some(category_id) = body.category_id {
        ensure_category(&state, category_id).await?;
    }

    let product = ProductRepository::new(state.pool())
        .update(id, &body)
        .await?;

    state.cache().invalidate_all(&CATALOG).await;

    Ok(Json(product))
}

/// Remove one of the caller's products from the storefront.
///
/// The row is kept so past orders still resolve.
///
/// # Route
///
/// `DELETE /api/products/{id}`
#[instrument(skip(state), fields(artist_id = %artist.artist_id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    owned_product(&state, artist, id).await?;

    ProductRepository::new(state.pool()).deactivate(id).await?;

    state.cache().invalidate_all(&CATALOG).await;
    tracing::info!(product_id = %id, "Product deactivated");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_images() {
        assert!(validate_images(&["https://res.cloudinary.com/x/image.jpg".to_string()]).is_ok());
        assert!(validate_images(&["javascript:alert(1)".to_string()]).is_err());
        assert!(validate_images(&["not a url".to_string()]).is_err());
        let many = vec!["https://example.com/a.jpg".to_string(); MAX_IMAGES + 1];
        assert!(validate_images(&many).is_err());
    }

    #[test]
    fn test_validate_name_and_stock() {
        assert!(validate_name("Dhokra horse").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }
}
