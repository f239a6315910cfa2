//! User repository for database operations.
//!
//! Registration creates the user and its role profile together, so every
//! account has exactly one artist or buyer profile.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tribal_market_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    name: String,
    role: UserRole,
    google_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            email,
            name: r.name,
            role: r.role,
            google_linked: r.google_id.is_some(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Fields for a new account.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a Email,
    pub name: &'a str,
    pub role: UserRole,
    /// Argon2 PHC string; `None` for Google-only accounts.
    pub password_hash: Option<&'a str>,
    pub google_id: Option<&'a str>,
}

const USER_COLUMNS: &str = "id, email, name, role, google_id, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their linked Google account ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_google_id(&self, google_id: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user's password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserWithHashRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let Some(password_hash) = r.password_hash else {
            return Ok(None);
        };

        Ok(Some((User::try_from(r.user)?, password_hash)))
    }

    /// Get a user's password hash by ID. `None` for Google-only accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(|(hash,)| hash).ok_or(RepositoryError::NotFound)
    }

    /// Create a user together with its artist or buyer profile.
    ///
    /// The profile's display name starts out as the account name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email (or Google account) already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_profile(&self, new: NewUser<'_>) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO users (email, name, role, password_hash, google_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(new.email.as_str())
        .bind(new.name)
        .bind(new.role)
        .bind(new.password_hash)
        .bind(new.google_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "email already exists"))?;

        let profile_sql = match new.role {
            UserRole::Artist => "INSERT INTO artist_profiles (user_id, display_name) VALUES ($1, $2)",
            UserRole::Buyer => "INSERT INTO buyer_profiles (user_id, full_name) VALUES ($1, $2)",
        };
        sqlx::query(profile_sql)
            .bind(row.id)
            .bind(new.name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        User::try_from(row)
    }

    /// Link a Google account to an existing user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the Google account is linked elsewhere.
    pub async fn link_google_id(&self, id: UserId, google_id: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET google_id = $1, updated_at = NOW() WHERE id = $2")
                .bind(google_id)
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::unique_violation(e, "google account already linked")
                })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
