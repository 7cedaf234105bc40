//! Application error type shared by every layer.
//!
//! [`AppError`] is the single terminal error of each engine operation. The HTTP
//! layer renders it as a JSON body:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Link not found", "details": {} } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Boxed lower-level cause carried by [`AppError::Store`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Empty or malformed input, out-of-range status or filter.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The caller-supplied link id already exists under some owner.
    #[error("Link id '{id}' already exists")]
    IdConflict { id: String },

    /// Any other uniqueness violation reported by the store.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// The secure random source could not supply bytes.
    #[error("Entropy source failure: {message}")]
    Entropy { message: String },

    /// The unit of work exceeded its deadline and was rolled back.
    #[error("{message}")]
    Cancelled { message: String },

    /// Transaction, commit or I/O failure in the store.
    #[error("Store operation '{operation}' failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn id_conflict(id: impl Into<String>) -> Self {
        Self::IdConflict { id: id.into() }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn entropy(message: impl Into<String>) -> Self {
        Self::Entropy {
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    /// Wraps a lower-level failure, naming the operation that hit it.
    pub fn store(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Store {
            operation,
            source: source.into(),
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Maps a sqlx error raised by `operation`.
    ///
    /// Unique violations become [`AppError::Conflict`] carrying the constraint
    /// name; everything else is a [`AppError::Store`].
    pub fn from_sqlx(operation: &'static str, e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return Self::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }

        Self::store(operation, e)
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::IdConflict { .. } | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Entropy { .. } | Self::Store { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the public error payload. Store causes are not exposed.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            Self::Validation { message, details } => {
                ("validation_error", message.clone(), details.clone())
            }
            Self::IdConflict { id } => ("id_conflict", self.to_string(), json!({ "id": id })),
            Self::Conflict { message, details } => ("conflict", message.clone(), details.clone()),
            Self::NotFound { message, details } => {
                ("not_found", message.clone(), details.clone())
            }
            Self::Unauthorized { message, details } => {
                ("unauthorized", message.clone(), details.clone())
            }
            Self::Entropy { .. } => (
                "entropy_error",
                "Failed to generate short path".to_string(),
                json!({}),
            ),
            Self::Cancelled { message } => ("cancelled", message.clone(), json!({})),
            Self::Store { operation, .. } => (
                "store_error",
                "Database error".to_string(),
                json!({ "operation": operation }),
            ),
            Self::Internal { message, details } => {
                ("internal_error", message.clone(), details.clone())
            }
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_error_info(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::from_sqlx("query", e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = e
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();

        Self::bad_request("Request validation failed", json!({ "fields": fields }))
    }
}
