//! JWT issuance and verification (HS256).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use tribal_market_core::{UserId, UserRole};

use super::AuthError;
use crate::models::User;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID, as a string per RFC 7519.
    pub sub: String,
    pub role: UserRole,
    pub email: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// The user ID in `sub`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user ID.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    /// Build keys from a shared secret. Tokens expire after `ttl`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenCreation` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            email: user.email.as_str().to_owned(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenCreation)
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tribal_market_core::Email;

    use super::*;

    fn keys(secret: &str, ttl: Duration) -> JwtKeys {
        JwtKeys::new(&SecretString::from(secret.to_owned()), ttl)
    }

    fn user() -> User {
        User {
            id: UserId::new(42),
            email: Email::parse("weaver@example.com").unwrap(),
            name: "Weaver".to_owned(),
            role: UserRole::Artist,
            google_linked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys("k7Hq2mZp9xVb4NcR8sTw1yLd6fGj3aUe", Duration::from_secs(3600));
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.role, UserRole::Artist);
        assert_eq!(claims.email, "weaver@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = keys("k7Hq2mZp9xVb4NcR8sTw1yLd6fGj3aUe", Duration::from_secs(60))
            .issue(&user())
            .unwrap();
        let other = keys("Zr5tYp0wQe8uIo7aSd6fGh4jKl3zXc2v", Duration::from_secs(60));

        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_rejects_expired() {
        let keys = keys("k7Hq2mZp9xVb4NcR8sTw1yLd6fGj3aUe", Duration::ZERO);
        let token = keys.issue(&user()).unwrap();
        std::thread::sleep(Duration::from_millis(1100));

        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_rejects_garbage() {
        let keys = keys("k7Hq2mZp9xVb4NcR8sTw1yLd6fGj3aUe", Duration::from_secs(60));
        assert!(keys.verify("not.a.jwt").is_err());
    }
}
