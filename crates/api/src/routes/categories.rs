//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::cache::Namespace;
use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireArtist;
use crate::models::category::slugify;
use crate::models::{Category, NewCategory};
use crate::state::AppState;

/// Longest accepted category name.
const MAX_NAME_LENGTH: usize = 100;

/// List every category.
///
/// # Route
///
/// `GET /api/categories`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state
        .cache()
        .get_or_set(Namespace::Categories, "all", || async {
            CategoryRepository::new(state.pool()).list().await
        })
        .await?;

    Ok(Json(categories))
}

/// One category by slug.
///
/// # Route
///
/// `GET /api/categories/{slug}`
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    let category = state
        .cache()
        .get_or_set(Namespace::Categories, &format!("slug:{slug}"), || async {
            CategoryRepository::new(state.pool())
                .get_by_slug(&slug)
                .await?
                .ok_or(RepositoryError::NotFound)
        })
        .await?;

    Ok(Json(category))
}

/// Create a category. Any artist may add one.
///
/// # Route
///
/// `POST /api/categories`
#[instrument(skip(state, _artist, body), fields(name = %body.name))]
pub async fn create(
    State(state): State<AppState>,
    _artist: RequireArtist,
    Json(body): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be 1 to {MAX_NAME_LENGTH} characters"
        )));
    }

    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "name must contain a letter or digit".to_string(),
        ));
    }

    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let category = CategoryRepository::new(state.pool())
        .create(name, &slug, description)
        .await?;

    state.cache().invalidate(Namespace::Categories).await;
    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}
