//! Authentication service.
//!
//! Provides password registration and login, password changes, Google
//! sign-in and JWT issuance.

mod error;
mod jwt;

pub use error::AuthError;
pub use jwt::{Claims, JwtKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::{info, instrument};

use tribal_market_core::{Email, UserId, UserRole};

use super::google::GoogleProfile;
use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum display name length.
const MAX_NAME_LENGTH: usize = 100;

/// Authentication service.
///
/// Handles user registration, login and Google sign-in.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new user and its role profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidName` if the name is blank or too long.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let name = validate_name(name)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_profile(NewUser {
                email: &email,
                name,
                role,
                password_hash: Some(&password_hash),
                google_id: None,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Unknown emails, accounts without a password and wrong passwords all
    /// produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong
    /// or the account has no password.
    /// Returns `AuthError::WeakPassword` if the new password doesn't meet requirements.
    #[instrument(skip(self, current, new))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let hash = self
            .users
            .get_password_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(current, &hash)?;

        validate_password(new)?;
        let new_hash = hash_password(new)?;
        self.users.update_password(user_id, &new_hash).await?;

        info!(%user_id, "password changed");
        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the user no longer exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    // =========================================================================
    // Google Sign-In
    // =========================================================================

    /// Find or create the user for a Google profile.
    ///
    /// Matches on the linked Google ID first, then links an existing account
    /// with the same email, and otherwise creates a buyer without a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnverifiedEmail` if Google has not verified the email.
    /// Returns `AuthError::Repository` if the database operation fails.
    #[instrument(skip_all, fields(google_id = %profile.sub))]
    pub async fn sign_in_with_google(&self, profile: &GoogleProfile) -> Result<User, AuthError> {
        if let Some(user) = self.users.get_by_google_id(&profile.sub).await? {
            return Ok(user);
        }

        if !profile.email_verified {
            return Err(AuthError::UnverifiedEmail);
        }
        let email = Email::parse(&profile.email)?;

        if let Some(mut user) = self.users.get_by_email(&email).await? {
            self.users.link_google_id(user.id, &profile.sub).await?;
            user.google_linked = true;
            info!(user_id = %user.id, "google account linked");
            return Ok(user);
        }

        let fallback_name = email.local_part().to_owned();
        let name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&fallback_name);
        let name: String = name.chars().take(MAX_NAME_LENGTH).collect();

        let user = self
            .users
            .create_with_profile(NewUser {
                email: &email,
                name: &name,
                role: UserRole::Buyer,
                password_hash: None,
                google_id: Some(&profile.sub),
            })
            .await?;

        info!(user_id = %user.id, "user registered with google");
        Ok(user)
    }
}

/// Validate a display name, returning it trimmed.
fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName {
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
