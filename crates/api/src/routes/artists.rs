//! Artist route handlers.
//!
//! Public artist profiles plus the artist portal's own-profile, products,
//! orders and dashboard endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use tribal_market_core::{ArtistId, Page, Pagination};

use crate::cache::Namespace;
use crate::db::{ArtistRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::error::Result;
use crate::middleware::RequireArtist;
use crate::models::{
    ArtistOrder, ArtistProfile, ArtistPublicProfile, ArtistStats, Product, UpdateArtistProfile,
};
use crate::state::AppState;

/// List artists.
///
/// # Route
///
/// `GET /api/artists`
pub async fn index(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<ArtistPublicProfile>>> {
    let suffix = format!("list:{}:{}", pagination.page(), pagination.limit());
    let page = state
        .cache()
        .get_or_set(Namespace::Artists, &suffix, || async {
            ArtistRepository::new(state.pool())
                .list_public(pagination)
                .await
        })
        .await?;

    Ok(Json(page))
}

/// One artist's public profile.
///
/// # Route
///
/// `GET /api/artists/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ArtistId>,
) -> Result<Json<ArtistPublicProfile>> {
    let profile = state
        .cache()
        .get_or_set(Namespace::Artists, &format!("id:{id}"), || async {
            ArtistRepository::new(state.pool())
                .get_public(id)
                .await?
                .ok_or(RepositoryError::NotFound)
        })
        .await?;

    Ok(Json(profile))
}

/// The signed-in artist's profile.
///
/// # Route
///
/// `GET /api/artists/me`
pub async fn me(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
) -> Result<Json<ArtistProfile>> {
    let profile = ArtistRepository::new(state.pool())
        .get(artist.artist_id)
        .await?;
    Ok(Json(profile))
}

/// Update the signed-in artist's profile.
///
/// # Route
///
/// `PUT /api/artists/me`
#[instrument(skip(state, body), fields(artist_id = %artist.artist_id))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
    Json(body): Json<UpdateArtistProfile>,
) -> Result<Json<ArtistProfile>> {
    let profile = ArtistRepository::new(state.pool())
        .update(artist.artist_id, &body)
        .await?;

    // Artist names appear in product listings too.
    state
        .cache()
        .invalidate_all(&[Namespace::Artists, Namespace::Products])
        .await;

    Ok(Json(profile))
}

/// The signed-in artist's products, inactive ones included.
///
/// # Route
///
/// `GET /api/artists/me/products`
pub async fn my_products(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list_by_artist(artist.artist_id)
        .await?;
    Ok(Json(products))
}

/// Orders containing the signed-in artist's items.
///
/// # Route
///
/// `GET /api/artists/me/orders`
pub async fn my_orders(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<ArtistOrder>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_artist(artist.artist_id, pagination)
        .await?;
    Ok(Json(orders))
}

/// Dashboard figures for the signed-in artist.
///
/// # Route
///
/// `GET /api/artists/me/stats`
pub async fn my_stats(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
) -> Result<Json<ArtistStats>> {
    let stats = ArtistRepository::new(state.pool())
        .stats(artist.artist_id)
        .await?;
    Ok(Json(stats))
}
