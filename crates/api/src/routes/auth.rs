//! Authentication route handlers.
//!
//! Password registration and login, the current user, logout and password
//! changes. Successful sign-ins return the JWT in the body and also set it
//! as an `HttpOnly` cookie for browser clients.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use tracing::instrument;

use tribal_market_core::UserRole;

use crate::config::ApiConfig;
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{AUTH_COOKIE_NAME, RequireAuth};
use crate::models::User;
use crate::services::auth::{AuthService, JwtKeys};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

const fn default_role() -> UserRole {
    UserRole::Buyer
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change payload.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// A signed-in user and their token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// =============================================================================
// Cookies
// =============================================================================

/// `Set-Cookie` value carrying a freshly issued token.
pub(crate) fn token_cookie(config: &ApiConfig, jwt: &JwtKeys, token: String) -> String {
    let max_age = i64::try_from(jwt.ttl().as_secs()).unwrap_or(i64::MAX);
    Cookie::build((AUTH_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age))
        .build()
        .to_string()
}

/// `Set-Cookie` value that removes the token cookie.
fn expired_token_cookie(config: &ApiConfig) -> String {
    Cookie::build((AUTH_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .build()
        .to_string()
}

/// Issue a token for `user` and build the JSON + cookie response.
///
/// The response owns everything it holds; it does not borrow `state`.
fn signed_in(
    state: &AppState,
    status: StatusCode,
    user: User,
) -> Result<impl IntoResponse + use<>> {
    let token = state.jwt().issue(&user)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    let cookie = token_cookie(state.config(), state.jwt(), token.clone());

    Ok((
        status,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(AuthResponse { token, user }),
    ))
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account with a buyer or artist profile.
///
/// # Route
///
/// `POST /api/auth/register`
#[instrument(skip(state, body), fields(email = %body.email, role = %body.role))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password, &body.name, body.role)
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    add_breadcrumb("auth", "User registered", None);

    signed_in(&state, StatusCode::CREATED, user)
}

/// Sign in with email and password.
///
/// # Route
///
/// `POST /api/auth/login`
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    signed_in(&state, StatusCode::OK, user)
}

/// The signed-in user.
///
/// # Route
///
/// `GET /api/auth/me`
pub async fn me(State(state): State<AppState>, auth: RequireAuth) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .get_user(auth.user_id()?)
        .await?;
    Ok(Json(user))
}

/// Clear the token cookie.
///
/// Tokens are stateless, so a bearer token stays valid until it expires.
///
/// # Route
///
/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, expired_token_cookie(state.config()))]),
    )
}

/// Change the signed-in user's password.
///
/// # Route
///
/// `POST /api/auth/password`
#[instrument(skip(state, auth, body))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(auth.user_id()?, &body.current_password, &body.new_password)
        .await?;

    add_breadcrumb("auth", "Password changed", None);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults_to_buyer() {
        let body: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"longenough","name":"Asha"}"#,
        )
        .unwrap();
        assert_eq!(body.role, UserRole::Buyer);
    }

    fn test_state() -> AppState {
        use std::time::Duration;

        use secrecy::SecretString;
        use sqlx::postgres::PgPoolOptions;

        use crate::cache::Cache;
        use crate::config::{CacheConfig, JwtConfig};

        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost:1/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 4000,
            base_url: "http://localhost:4000".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            jwt: JwtConfig {
                secret: SecretString::from("k7#Qp2!vZ9xLm4@Rt8wYb1$Nc6Hd3Fg0"),
                ttl: Duration::from_secs(3600),
            },
            cache: CacheConfig {
                redis_url: None,
                ttl: Duration::from_secs(60),
            },
            cloudinary: None,
            google: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/test")
            .unwrap();
        AppState::new(config, pool, Cache::in_memory(Duration::from_secs(60)))
    }

    fn potter() -> User {
        let now = chrono::Utc::now();
        User {
            id: tribal_market_core::UserId::new(7),
            email: tribal_market_core::Email::parse("potter@example.com").unwrap(),
            name: "Potter".to_string(),
            role: UserRole::Artist,
            google_linked: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_signed_in_response_outlives_state() {
        let response = {
            let state = test_state();
            signed_in(&state, StatusCode::CREATED, potter()).unwrap()
        };
        let response = response.into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
    }
}
