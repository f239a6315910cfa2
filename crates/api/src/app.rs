//! Router assembly.
//!
//! [`build_router`] wires the health checks, the `/api` routes and the
//! middleware stack. Tests drive the returned router directly.

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::from_fn,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::routes;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// CORS for the frontend origin, with credentials so the token cookie
/// travels on cross-origin requests.
fn cors_layer(frontend_url: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(frontend_url) {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!(frontend_url, error = %e, "Invalid frontend URL, CORS disabled");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .expose_headers([header::HeaderName::from_static(
                crate::middleware::request_id::REQUEST_ID_HEADER,
            )]),
    )
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let cors = cors_layer(&state.config().frontend_url);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(session_layer));

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_requires_valid_origin() {
        assert!(cors_layer("http://localhost:3000").is_some());
        assert!(cors_layer("http://bad\norigin").is_none());
    }
}
