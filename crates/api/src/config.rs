//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKET_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `MARKET_JWT_SECRET` - JWT signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `MARKET_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKET_PORT` - Listen port (default: 4000)
//! - `MARKET_BASE_URL` - Public URL of this API (default: <http://localhost:4000>)
//! - `MARKET_FRONTEND_URL` - Storefront origin for CORS and OAuth redirects
//!   (default: <http://localhost:3000>)
//! - `MARKET_JWT_TTL_HOURS` - Token lifetime (default: 168)
//! - `REDIS_URL` - Redis cache; in-process cache is used when unset
//! - `MARKET_CACHE_TTL_SECS` - Cache entry lifetime (default: 300)
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` -
//!   Image uploads (all three required to enable)
//! - `CLOUDINARY_FOLDER` - Upload folder (default: tribal-market)
//! - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` - Google sign-in (both required to enable)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Storefront origin (CORS, OAuth landing page)
    pub frontend_url: String,
    /// Token signing configuration
    pub jwt: JwtConfig,
    /// Cache backend configuration
    pub cache: CacheConfig,
    /// Cloudinary upload configuration, if enabled
    pub cloudinary: Option<CloudinaryConfig>,
    /// Google OAuth configuration, if enabled
    pub google: Option<GoogleOAuthConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// JWT signing configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret for HS256 signing
    pub secret: SecretString,
    /// How long issued tokens stay valid
    pub ttl: Duration,
}

/// Cache backend configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL; `None` selects the in-process cache
    pub redis_url: Option<SecretString>,
    /// Lifetime of cached entries
    pub ttl: Duration,
}

/// Cloudinary upload configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Cloudinary cloud name
    pub cloud_name: String,
    /// API key (sent with each signed upload)
    pub api_key: String,
    /// API secret (used to sign uploads, never sent)
    pub api_secret: SecretString,
    /// Folder uploaded assets are placed in
    pub folder: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .finish()
    }
}

/// Google OAuth client configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MARKET_DATABASE_URL")?;
        let host = parse_env("MARKET_HOST", "127.0.0.1")?;
        let port = parse_env("MARKET_PORT", "4000")?;
        let base_url = trim_trailing_slash(get_env_or_default(
            "MARKET_BASE_URL",
            "http://localhost:4000",
        ));
        let frontend_url = trim_trailing_slash(get_env_or_default(
            "MARKET_FRONTEND_URL",
            "http://localhost:3000",
        ));

        let jwt = JwtConfig::from_env()?;
        let cache = CacheConfig::from_env()?;
        let cloudinary = CloudinaryConfig::from_env()?;
        let google = GoogleOAuthConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            frontend_url,
            jwt,
            cache,
            cloudinary,
            google,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("MARKET_JWT_SECRET")?;
        validate_secret_length(&secret, "MARKET_JWT_SECRET")?;
        let hours: u64 = parse_env("MARKET_JWT_TTL_HOURS", "168")?;
        if hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MARKET_JWT_TTL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            secret,
            ttl: Duration::from_secs(hours * 60 * 60),
        })
    }
}

impl CacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secs: u64 = parse_env("MARKET_CACHE_TTL_SECS", "300")?;
        Ok(Self {
            redis_url: get_optional_env("REDIS_URL").map(SecretString::from),
            ttl: Duration::from_secs(secs.max(1)),
        })
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(cloud_name), Some(api_key)) = (
            get_optional_env("CLOUDINARY_CLOUD_NAME"),
            get_optional_env("CLOUDINARY_API_KEY"),
        ) else {
            return Ok(None);
        };
        let api_secret = get_required_env("CLOUDINARY_API_SECRET")?;

        Ok(Some(Self {
            cloud_name,
            api_key,
            api_secret: SecretString::from(api_secret),
            folder: get_env_or_default("CLOUDINARY_FOLDER", "tribal-market"),
        }))
    }
}

impl GoogleOAuthConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(client_id) = get_optional_env("GOOGLE_CLIENT_ID") else {
            return Ok(None);
        };
        let client_secret = get_required_env("GOOGLE_CLIENT_SECRET")?;

        Ok(Some(Self {
            client_id,
            client_secret: SecretString::from(client_secret),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST").is_ok());
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(
            trim_trailing_slash("http://localhost:3000//".to_string()),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_socket_addr_and_secure_cookies() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 4000,
            base_url: "https://api.tribal.market".to_string(),
            frontend_url: "https://tribal.market".to_string(),
            jwt: JwtConfig {
                secret: SecretString::from("x".repeat(32)),
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
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 4000);
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_cloudinary_config_debug_redacts_secret() {
        let config = CloudinaryConfig {
            cloud_name: "tribal".to_string(),
            api_key: "1234567890".to_string(),
            api_secret: SecretString::from("super_secret_cloudinary_value"),
            folder: "tribal-market".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("tribal"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_cloudinary_value"));
    }

    #[test]
    fn test_google_config_debug_redacts_secret() {
        let config = GoogleOAuthConfig {
            client_id: "client-id.apps.googleusercontent.com".to_string(),
            client_secret: SecretString::from("super_secret_google_value"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("client-id.apps.googleusercontent.com"));
        assert!(!debug_output.contains("super_secret_google_value"));
    }
}
