//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{prefix}/{code}` - Short link redirect (public)
//! - `GET  /health`          - Health check: store and cache (public)
//! - `/api/*`                - Owner API (bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket
//! - **Authentication** - Owner bearer token on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::rate_limit::{self, RateLimit};
use crate::api::middleware::{auth, tracing as trace};
use crate::domain::repositories::LinkStore;
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router with every route and middleware except path
/// normalization.
///
/// `api_limit` applies to `/api`; public routes use [`RateLimit::PUBLIC`].
///
/// # Errors
///
/// Returns an error if a rate limit is invalid.
pub fn build_router<S: LinkStore>(
    state: AppState<S>,
    api_limit: RateLimit,
) -> anyhow::Result<Router> {
    let api_router = api::routes::protected_routes::<S>()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::layer::<S>,
        ))
        .layer(rate_limit::layer(api_limit)?);

    let public_router = Router::new()
        .route("/health", get(health_handler::<S>))
        .route("/{prefix}/{code}", get(redirect_handler::<S>))
        .layer(rate_limit::layer(RateLimit::PUBLIC)?);

    Ok(Router::new()
        .merge(public_router)
        .nest("/api", api_router)
        .with_state(state)
        .layer(trace::layer()))
}

/// Constructs the application service, trimming trailing slashes before
/// routing.
///
/// # Errors
///
/// Returns an error if a rate limit is invalid.
pub fn app_router<S: LinkStore>(
    state: AppState<S>,
    api_limit: RateLimit,
) -> anyhow::Result<NormalizePath<Router>> {
    let router = build_router(state, api_limit)?;
    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}
