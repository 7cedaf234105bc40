//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::json;
use tracing::warn;

use crate::domain::repositories::LinkStore;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short path to its original URL.
///
/// # Endpoint
///
/// `GET /{prefix}/{code}`
///
/// # Cache Strategy
///
/// - **Cache hit**: immediate redirect
/// - **Cache miss**: resolve through the store, cache the active link, then
///   re-read the store and drop the entry if the link changed meanwhile
/// - **Cache error**: treated as a miss
///
/// # Errors
///
/// Returns 404 Not Found when the short path is unknown or the link is
/// inactive; both cases look the same to the client.
pub async fn redirect_handler<S: LinkStore>(
    Path((prefix, code)): Path<(String, String)>,
    State(state): State<AppState<S>>,
) -> Result<Redirect, AppError> {
    let short = format!("{prefix}/{code}");

    if let Ok(Some(original)) = state.cache.get_original(&short).await {
        return Ok(Redirect::temporary(&original));
    }

    let original = state
        .link_service
        .resolve_original(&short)
        .await?
        .ok_or_else(|| AppError::not_found("Short link not found", json!({ "short": short })))?;

    if let Err(e) = state.cache.set_original(&short, &original, None).await {
        warn!(error = %e, short, "Failed to cache redirect");
        return Ok(Redirect::temporary(&original));
    }

    // A status change may have committed and invalidated between the read
    // above and the cache write; re-read so a stale entry never outlives it.
    let current = state.link_service.resolve_original(&short).await;

    if !matches!(&current, Ok(Some(latest)) if *latest == original)
        && let Err(e) = state.cache.invalidate(&short).await
    {
        warn!(error = %e, short, "Failed to drop stale cache entry");
    }

    match current? {
        Some(original) => Ok(Redirect::temporary(&original)),
        None => Err(AppError::not_found(
            "Short link not found",
            json!({ "short": short }),
        )),
    }
}
