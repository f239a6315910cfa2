//! Google OAuth 2.0 client (authorization code flow).
//!
//! 1. Redirect the browser to `authorization_url()` with a random `state`
//!    stored in the server-side session.
//! 2. Google redirects back with `code` and `state`.
//! 3. `exchange_code()` trades the code for an access token.
//! 4. `user_info()` fetches the verified profile used to sign the user in.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleOAuthConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors from the Google OAuth flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("userinfo request failed with status {0}")]
    UserInfo(reqwest::StatusCode),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// The Google account profile returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable Google account ID.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
}

/// Client for Google's OAuth endpoints.
#[derive(Clone)]
pub struct GoogleClient {
    inner: Arc<GoogleClientInner>,
}

struct GoogleClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl GoogleClient {
    /// Create a new client sharing `client` for HTTP.
    #[must_use]
    pub fn new(config: &GoogleOAuthConfig, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(GoogleClientInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.expose_secret().to_string(),
            }),
        }
    }

    /// Build the consent screen URL.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL registered with Google
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            access_type=online&\
            prompt=select_account&\
            state={}",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::TokenExchange` if Google rejects the code.
    /// Returns `OAuthError::Http` on transport failures.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.inner.client.post(TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(text));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the signed-in account's profile.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::UserInfo` on a non-success status.
    /// Returns `OAuthError::Http` on transport or decoding failures.
    pub async fn user_info(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .inner
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::UserInfo(response.status()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_authorization_url_encodes_params() {
        let client = GoogleClient::new(
            &GoogleOAuthConfig {
                client_id: "abc.apps.googleusercontent.com".to_owned(),
                client_secret: SecretString::from("shh".to_owned()),
            },
            reqwest::Client::new(),
        );

        let url = client.authorization_url("http://localhost:4000/api/auth/google/callback", "s t");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=abc.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A4000%2Fapi%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("state=s%20t"));
    }
}
