//! Error types for the HTTP API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Refused
//! entries never reach this type; they are ordinary `200` payloads with
//! `success: false`.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crowdwatch_core::OccupancyError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Login failed, or a bearer token was missing, malformed, expired, or
    /// issued to someone other than the admin.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<OccupancyError> for ApiError {
    fn from(err: OccupancyError) -> Self {
        match err {
            OccupancyError::NotFound(_) => Self::NotFound(String::from("Location not found")),
            OccupancyError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                Self::Internal(String::from("store unavailable"))
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::InvalidCredentials(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
