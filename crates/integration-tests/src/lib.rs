//! Test harness for driving the marketplace API router in-process.
//!
//! The router is built exactly as the server builds it, but over a lazily
//! connected pool that points at a closed port and the in-memory cache.
//! Anything that is decided before the first query (routing, auth
//! rejections, validation, rate limits, CORS) can be tested without a
//! database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tribal-market-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use tribal_market_api::build_router;
use tribal_market_api::cache::Cache;
use tribal_market_api::config::{ApiConfig, CacheConfig, JwtConfig};
use tribal_market_api::models::User;
use tribal_market_api::services::auth::JwtKeys;
use tribal_market_api::state::AppState;
use tribal_market_core::{Email, UserId, UserRole};

/// Frontend origin the test config allows.
pub const FRONTEND_URL: &str = "http://localhost:3000";

/// Client address reported to the rate limiters.
pub const CLIENT_IP: &str = "203.0.113.10";

/// A JWT secret that passes the strength checks.
const TEST_JWT_SECRET: &str = "q8Zr!x2Lw#9vKp4Tn7Ys@1Hb6Jd3Fg0Mc";

/// Configuration with no optional integrations enabled.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://tm:tm@127.0.0.1:1/tm_test".to_owned()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 4000,
        base_url: "http://localhost:4000".to_owned(),
        frontend_url: FRONTEND_URL.to_owned(),
        jwt: JwtConfig {
            secret: SecretString::from(TEST_JWT_SECRET.to_owned()),
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
    }
}

/// A response decoded for assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, `Value::Null` when empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// The `error` message of a JSON error body.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// A header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The API router plus the keys to mint tokens for it.
pub struct TestApp {
    router: Router,
    jwt: JwtKeys,
}

impl TestApp {
    /// Build the app without a reachable database.
    #[must_use]
    pub fn new() -> Self {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy("postgres://tm:tm@127.0.0.1:1/tm_test")
            .unwrap();
        let jwt = JwtKeys::new(&config.jwt.secret, config.jwt.ttl);
        let state = AppState::new(config, pool, Cache::in_memory(Duration::from_secs(60)));

        Self {
            router: build_router(state),
            jwt,
        }
    }

    /// Mint a valid token for a user with `role`.
    #[must_use]
    pub fn token_for(&self, role: UserRole) -> String {
        let now = Utc::now();
        let user = User {
            id: UserId::new(42),
            email: Email::parse("tester@example.com").unwrap(),
            name: "Tester".to_owned(),
            role,
            google_linked: false,
            created_at: now,
            updated_at: now,
        };
        self.jwt.issue(&user).unwrap()
    }

    /// Send a request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` with an optional bearer token and a client IP.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Request with a JSON body, an optional bearer token and a client IP
    /// for the rate limiter.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: &Value,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
