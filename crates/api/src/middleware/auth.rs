//! Authentication extractors.
//!
//! API requests carry a JWT either as `Authorization: Bearer <token>` or in
//! the `token` cookie set by the auth routes. The header wins when both are
//! present. Handlers opt in by taking one of the extractors below; the
//! rejection is an [`AppError`], so failures render as the usual JSON error.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn my_products(RequireArtist(artist): RequireArtist) -> Result<Json<Vec<Product>>> {
//!     // artist.artist_id is the caller's profile id
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};
use tribal_market_core::{ArtistId, BuyerId, UserId, UserRole};

use crate::db::{ArtistRepository, BuyerRepository};
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::Claims;
use crate::state::AppState;

/// Name of the cookie holding the JWT.
pub const AUTH_COOKIE_NAME: &str = "token";

/// Pull the raw token from the request headers.
fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == AUTH_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value)
}

/// Any authenticated user. Yields the verified token claims.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Claims);

impl RequireAuth {
    /// The caller's user id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if the subject claim is malformed.
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0
            .user_id()
            .map_err(|_| AppError::Unauthorized("Authentication required".to_string()))
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let claims = state
            .jwt()
            .verify(token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        set_sentry_user(&claims.sub, Some(&claims.email));

        Ok(Self(claims))
    }
}

/// An authenticated artist with their profile id.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedArtist {
    pub user_id: UserId,
    pub artist_id: ArtistId,
}

/// Requires a signed-in artist (403 for buyers).
#[derive(Debug, Clone, Copy)]
pub struct RequireArtist(pub AuthenticatedArtist);

impl<S> FromRequestParts<S> for RequireArtist
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = RequireAuth::from_request_parts(parts, state).await?;
        if auth.0.role != UserRole::Artist {
            return Err(AppError::Forbidden("Artist account required".to_string()));
        }

        let user_id = auth.user_id()?;
        let state = AppState::from_ref(state);
        let artist_id = ArtistRepository::new(state.pool())
            .id_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Artist profile not found".to_string()))?;

        Ok(Self(AuthenticatedArtist { user_id, artist_id }))
    }
}

/// An authenticated buyer with their profile id.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedBuyer {
    pub user_id: UserId,
    pub buyer_id: BuyerId,
}

/// Requires a signed-in buyer (403 for artists).
#[derive(Debug, Clone, Copy)]
pub struct RequireBuyer(pub AuthenticatedBuyer);

impl<S> FromRequestParts<S> for RequireBuyer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = RequireAuth::from_request_parts(parts, state).await?;
        if auth.0.role != UserRole::Buyer {
            return Err(AppError::Forbidden("Buyer account required".to_string()));
        }

        let user_id = auth.user_id()?;
        let state = AppState::from_ref(state);
        let buyer_id = BuyerRepository::new(state.pool())
            .id_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Buyer profile not found".to_string()))?;

        Ok(Self(AuthenticatedBuyer { user_id, buyer_id }))
    }
}
