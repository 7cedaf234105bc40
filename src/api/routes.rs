//! API route configuration.
//!
//! All API endpoints require an owner bearer token via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    count_links_handler, create_link_handler, list_links_handler, update_status_handler,
};
use crate::domain::repositories::LinkStore;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch},
};

/// Owner-scoped link routes.
///
/// # Endpoints
///
/// - `POST  /links`        - Shorten a URL
/// - `GET   /links`        - List links (`?filter=all|active|inactive`)
/// - `PATCH /links/status` - Activate or deactivate a link
/// - `GET   /links/count`  - Total and active link counts
pub fn protected_routes<S: LinkStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/links",
            get(list_links_handler::<S>).post(create_link_handler::<S>),
        )
        .route("/links/status", patch(update_status_handler::<S>))
        .route("/links/count", get(count_links_handler::<S>))
}
