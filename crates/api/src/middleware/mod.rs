//! HTTP middleware stack for the marketplace API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS for the storefront origin
//! 5. Session layer (tower-sessions with `PostgreSQL` store), `/api/auth` only
//! 6. Rate limiting (governor) on the auth and upload routes
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireAuth`], [`RequireArtist`] and [`RequireBuyer`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    AUTH_COOKIE_NAME, AuthenticatedArtist, AuthenticatedBuyer, RequireArtist,
    RequireAuth, RequireBuyer,
};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
