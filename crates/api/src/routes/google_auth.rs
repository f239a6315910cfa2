//! Google OAuth route handlers.
//!
//! - Start: stores a random CSRF state in the session and redirects to Google
//! - Callback: checks the state, exchanges the code, signs the user in and
//!   redirects back to the storefront with the token cookie set
//!
//! Failures after the redirect to Google land on the storefront's login page
//! with an `error` query parameter instead of a JSON error.

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, add_breadcrumb, set_sentry_user};
use crate::models::session_keys;
use crate::services::auth::AuthService;
use crate::services::google::GoogleClient;
use crate::state::AppState;

use super::auth::token_cookie;

/// Length of the CSRF state parameter.
const STATE_LENGTH: usize = 32;

/// Query parameters accepted when starting the flow.
#[derive(Debug, Default, Deserialize)]
pub struct StartQuery {
    /// Storefront path to land on after sign-in.
    pub return_to: Option<String>,
}

/// Query parameters from Google's callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn random_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Only same-site relative paths may be used as a post-login destination.
fn safe_return_path(path: Option<&str>) -> &str {
    match path {
        Some(p) if p.starts_with('/') && !p.starts_with("//") && !p.contains('\\') => p,
        _ => "/",
    }
}

fn redirect_uri(state: &AppState) -> String {
    format!("{}/api/auth/google/callback", state.config().base_url)
}

fn google(state: &AppState) -> Result<&GoogleClient> {
    state
        .google()
        .ok_or_else(|| AppError::ServiceUnavailable("Google sign-in is not configured".to_string()))
}

/// Redirect to the storefront login page with an error code.
fn login_error(state: &AppState, code: &str) -> Response {
    Redirect::to(&format!("{}/login?error={code}", state.config().frontend_url)).into_response()
}

/// Start Google sign-in.
///
/// # Route
///
/// `GET /api/auth/google`
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<StartQuery>,
) -> Result<Redirect> {
    let client = google(&state)?;
    let oauth_state = random_state();
    let return_to = safe_return_path(query.return_to.as_deref()).to_owned();

    session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store OAuth state: {e}")))?;
    session
        .insert(session_keys::GOOGLE_OAUTH_RETURN_TO, &return_to)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store OAuth state: {e}")))?;

    Ok(Redirect::to(
        &client.authorization_url(&redirect_uri(&state), &oauth_state),
    ))
}

/// Handle Google's redirect back to the API.
///
/// # Route
///
/// `GET /api/auth/google/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let client = match google(&state) {
        Ok(client) => client,
        Err(e) => return e.into_response(),
    };

    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google OAuth denied");
        return login_error(&state, "google_denied");
    }

    let Some(code) = query.code else {
        tracing::warn!("Google OAuth callback missing code");
        return login_error(&state, "missing_code");
    };

    let stored_state: Option<String> = session
        .remove(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();
    let return_to: Option<String> = session
        .remove(session_keys::GOOGLE_OAUTH_RETURN_TO)
        .await
        .ok()
        .flatten();

    if stored_state.is_none() || stored_state != query.state {
        tracing::warn!("Google OAuth state mismatch");
        return login_error(&state, "invalid_state");
    }

    let profile = match client.exchange_code(&code, &redirect_uri(&state)).await {
        Ok(access_token) => match client.user_info(&access_token).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch Google profile");
                return login_error(&state, "google_failed");
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to exchange Google code");
            return login_error(&state, "google_failed");
        }
    };

    let user = match AuthService::new(state.pool())
        .sign_in_with_google(&profile)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Google sign-in rejected");
            return login_error(&state, "google_account");
        }
    };

    let token = match state.jwt().issue(&user) {
        Ok(token) => token,
        Err(e) => return AppError::from(e).into_response(),
    };

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Signed in with Google", None);
    tracing::info!(user_id = %user.id, "User signed in with Google");

    let destination = format!(
        "{}{}",
        state.config().frontend_url,
        safe_return_path(return_to.as_deref())
    );
    (
        AppendHeaders([(SET_COOKIE, token_cookie(state.config(), state.jwt(), token))]),
        Redirect::to(&destination),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/orders/12")), "/orders/12");
        assert_eq!(safe_return_path(Some("//evil.example")), "/");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/");
        assert_eq!(safe_return_path(Some("/\\evil.example")), "/");
        assert_eq!(safe_return_path(None), "/");
    }

    #[test]
    fn test_random_state_is_alphanumeric() {
        let s = random_state();
        assert_eq!(s.len(), STATE_LENGTH);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
