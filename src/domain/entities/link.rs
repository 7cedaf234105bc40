//! Link entity, its visibility status and list filter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::fmt;

use crate::error::AppError;

/// Visibility state of a link.
///
/// Only active links resolve publicly. The discriminants are the values
/// persisted in the `links.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active = 1,
    Inactive = 2,
}

impl LinkStatus {
    /// Maps the transport-level `is_active` flag.
    pub fn from_active(is_active: bool) -> Self {
        if is_active {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i64> for LinkStatus {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Active),
            2 => Ok(Self::Inactive),
            other => Err(AppError::bad_request(
                "Status is out of range",
                json!({ "status": other, "allowed": [1, 2] }),
            )),
        }
    }
}

impl TryFrom<i16> for LinkStatus {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Status selector for listing an owner's links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl ListFilter {
    /// Status constraint applied by the repository, `None` for [`ListFilter::All`].
    pub fn status(self) -> Option<LinkStatus> {
        match self {
            Self::All => None,
            Self::Active => Some(LinkStatus::Active),
            Self::Inactive => Some(LinkStatus::Inactive),
        }
    }
}

impl TryFrom<i64> for ListFilter {
    type Error = AppError;

    /// `0` selects all links, `1` active and `2` inactive ones.
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::All),
            1 => Ok(Self::Active),
            2 => Ok(Self::Inactive),
            other => Err(invalid_filter(json!(other))),
        }
    }
}

impl TryFrom<&str> for ListFilter {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(invalid_filter(json!(value))),
        }
    }
}

fn invalid_filter(value: serde_json::Value) -> AppError {
    AppError::bad_request(
        "Invalid list filter",
        json!({ "filter": value, "allowed": ["all", "active", "inactive"] }),
    )
}

/// A persisted short link.
///
/// The owner id is not part of the record; it is always passed alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub original: String,
    pub short: String,
    pub status: LinkStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Caller-supplied link passed to the save operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub id: String,
    pub original: String,
    pub short: String,
    pub status: LinkStatus,
}

impl NewLink {
    pub fn new(
        id: impl Into<String>,
        original: impl Into<String>,
        short: impl Into<String>,
        status: LinkStatus,
    ) -> Self {
        Self {
            id: id.into(),
            original: original.into(),
            short: short.into(),
            status,
        }
    }

    /// Checks required fields and the destination URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `id`, `original` or `short` is empty,
    /// or if `original` is not an absolute `http`/`https` URL.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.is_empty() {
            return Err(AppError::bad_request("id is required", json!({})));
        }
        if self.original.is_empty() {
            return Err(AppError::bad_request("original is required", json!({})));
        }
        if self.short.is_empty() {
            return Err(AppError::bad_request("short is required", json!({})));
        }

        match url::Url::parse(&self.original) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
                Ok(())
            }
            Ok(parsed) => Err(AppError::bad_request(
                "original must be an http or https URL",
                json!({ "original": self.original, "scheme": parsed.scheme() }),
            )),
            Err(e) => Err(AppError::bad_request(
                "original is not a valid URL",
                json!({ "original": self.original, "reason": e.to_string() }),
            )),
        }
    }
}

/// Per-owner link counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LinkCounts {
    pub total: i64,
    pub active: i64,
}
