//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{domain::repositories::LinkStore, error::AppError, state::AppState};

/// Owner id verified from the request's bearer token.
///
/// Inserted into request extensions by [`layer`]; handlers read it with
/// `Extension<OwnerId>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

/// Authenticates the owner of a request.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <owner_id>.<signature>
/// ```
///
/// # Errors
///
/// Returns `401 Unauthorized` with `WWW-Authenticate: Bearer` if the header
/// is missing or the token does not verify.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/links", get(list_links_handler::<S>))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer::<S>));
/// ```
pub async fn layer<S: LinkStore>(
    State(st): State<AppState<S>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Authorization header is missing or invalid" }),
            )
        })?;

    let owner_id = st.auth_service.verify(&token)?;
    tracing::debug!(owner_id, "Owner authenticated");

    parts.extensions.insert(OwnerId(owner_id));
    Ok(next.run(Request::from_parts(parts, body)).await)
}
