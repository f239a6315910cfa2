//! User management commands.
//!
//! ```bash
//! tm-cli user create -e weaver@example.com -n "Asha Devi" -r artist
//! ```
//!
//! The generated password is logged once; the user should change it through
//! `POST /api/auth/password`.

use rand::{Rng, distr::Alphanumeric};

use tribal_market_api::services::auth::AuthService;
use tribal_market_core::UserRole;

use super::connect;

/// Generated password length.
const PASSWORD_LENGTH: usize = 20;

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Create a user and matching profile with a random password.
///
/// # Errors
///
/// Returns an error for an unknown role, invalid input, a duplicate email
/// or a database failure.
pub async fn create(email: &str, name: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let role: UserRole = role.parse()?;
    let password = generate_password();

    let pool = connect().await?;
    let user = AuthService::new(&pool)
        .register(email, &password, name, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    tracing::info!("Temporary password: {password}");
    tracing::warn!("The password is not shown again. Ask the user to change it after signing in.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
