//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Link, LinkStatus};
use crate::utils::code_generator::short_url;

/// Request to shorten a URL for the authenticated owner.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// The original URL (must be a valid HTTP/HTTPS URL).
    #[validate(url(message = "Invalid URL format"), length(max = 2048))]
    pub url: String,

    /// Initial visibility, active when omitted.
    pub is_active: Option<bool>,
}

/// Request to change the visibility of an existing link.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    pub is_active: bool,
}

/// Query string of the list endpoint: `?filter=all|active|inactive`.
#[derive(Debug, Default, Deserialize)]
pub struct ListLinksQuery {
    pub filter: Option<String>,
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: String,
    pub original: String,
    pub short: String,
    pub short_url: String,
    pub status: LinkStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn from_link(link: Link, base_url: &str) -> Self {
        Self {
            short_url: short_url(base_url, &link.short),
            is_active: link.is_active(),
            id: link.id,
            original: link.original,
            short: link.short,
            status: link.status,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// Links of the authenticated owner.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub filter: String,
    pub count: usize,
    pub items: Vec<LinkResponse>,
}
