//! # emlak-api — Axum HTTP service for the Emlak platform
//!
//! Public listing search over the property query pipeline, plus the
//! agency back-office: listing CRUD, CRM customers, user management and
//! the activity audit console.
//!
//! ## API Surface
//!
//! | Prefix                | Module                 | Access  |
//! |-----------------------|------------------------|---------|
//! | `/v1/properties` (GET)| [`routes::properties`] | public  |
//! | `/v1/properties` (mut)| [`routes::properties`] | session |
//! | `/v1/customers/*`     | [`routes::customers`]  | session |
//! | `/v1/users/*`         | [`routes::users`]      | admin   |
//! | `/v1/auth/*`          | [`routes::auth`]       | mixed   |
//! | `/v1/activity/*`      | [`routes::activity`]   | admin   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → RateLimitMiddleware → SessionAuth → Handler
//! ```
//!
//! Health probes (`/health/*`) and the public listing routes are
//! mounted outside the session middleware.

pub mod audit;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod session;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::session::{SessionAuthConfig, SessionTtl};
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(RateLimitConfig::default());
    let session_config = SessionAuthConfig {
        ttl: SessionTtl::from_secs(
            state.config.session_ttl_secs,
            state.config.remember_ttl_secs,
        ),
    };

    // Back-office routes behind the session middleware.
    let admin = Router::new()
        .merge(routes::properties::admin_router())
        .merge(routes::customers::router())
        .merge(routes::users::router())
        .merge(routes::activity::router())
        .merge(routes::auth::admin_router())
        .layer(from_fn(session::session_auth_middleware));

    // Public routes: listing search/detail, login, OpenAPI.
    let public = Router::new()
        .merge(routes::properties::public_router())
        .merge(routes::auth::public_router())
        .merge(openapi::router());

    let api = Router::new()
        .merge(public)
        .merge(admin)
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(state.sessions.clone()))
        .layer(axum::Extension(session_config))
        .layer(axum::Extension(metrics))
        .layer(axum::Extension(limiter))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
