//! Handlers for the owner's link management endpoints.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use validator::Validate;

use crate::api::dto::link::{
    CreateLinkRequest, LinkListResponse, LinkResponse, ListLinksQuery, UpdateStatusRequest,
};
use crate::api::middleware::auth::OwnerId;
use crate::domain::entities::{LinkCounts, LinkStatus, ListFilter};
use crate::domain::repositories::LinkStore;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL for the authenticated owner.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/page", "is_active": true }
/// ```
///
/// Shortening a URL the owner already has returns the existing link with
/// its status set to `is_active`.
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
pub async fn create_link_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let status = LinkStatus::from_active(payload.is_active.unwrap_or(true));
    let link = state
        .link_service
        .shorten(&owner_id, &payload.url, status)
        .await?;

    // re-saving an existing link may have deactivated it
    invalidate(&state, &link.short).await;

    Ok(Json(LinkResponse::from_link(link, &state.base_url)))
}

/// Lists the owner's links.
///
/// # Endpoint
///
/// `GET /api/links?filter=all|active|inactive`
///
/// # Errors
///
/// Returns 400 Bad Request for an unknown filter.
pub async fn list_links_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Query(query): Query<ListLinksQuery>,
) -> Result<Json<LinkListResponse>, AppError> {
    let filter_name = query.filter.unwrap_or_else(|| "all".to_string());
    let filter = ListFilter::try_from(filter_name.as_str())?;

    let items: Vec<LinkResponse> = state
        .link_service
        .list_links(&owner_id, filter)
        .await?
        .into_iter()
        .map(|link| LinkResponse::from_link(link, &state.base_url))
        .collect();

    Ok(Json(LinkListResponse {
        filter: filter_name.to_ascii_lowercase(),
        count: items.len(),
        items,
    }))
}

/// Activates or deactivates one of the owner's links.
///
/// # Endpoint
///
/// `PATCH /api/links/status`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/page", "is_active": false }
/// ```
///
/// # Cache
///
/// The redirect cache entry is dropped so a deactivated link stops
/// resolving immediately.
///
/// # Errors
///
/// Returns 404 Not Found if the owner has no link for `url`.
pub async fn update_status_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update_status(
            &payload.url,
            &owner_id,
            LinkStatus::from_active(payload.is_active),
        )
        .await?;

    invalidate(&state, &link.short).await;

    Ok(Json(LinkResponse::from_link(link, &state.base_url)))
}

/// Total and active link counts of the owner.
///
/// # Endpoint
///
/// `GET /api/links/count`
pub async fn count_links_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
) -> Result<Json<LinkCounts>, AppError> {
    Ok(Json(state.link_service.count_links(&owner_id).await?))
}

async fn invalidate<S: LinkStore>(state: &AppState<S>, short: &str) {
    if let Err(e) = state.cache.invalidate(short).await {
        tracing::warn!(error = %e, short, "Failed to invalidate cache");
    }
}
