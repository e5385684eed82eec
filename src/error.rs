//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::services::query_classifier::PolicyViolation;
use crate::store::StoreError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Authorization**: Credential or caller rejected, cause withheld
/// - **Policy**: Query text failed classification
/// - **Persistence**: Backing store failed to execute or confirm
/// - **Validation**: Malformed input, rejected before any store interaction
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Credential not found, inactive, expired or lacking the elevated
    /// capability; or caller identity unknown or disabled.
    ///
    /// Every cause renders the same message. Returns HTTP 401 Unauthorized.
    #[error("Not authorized")]
    AuthorizationDenied,

    /// Query text was rejected by the read-only policy.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error(transparent)]
    PolicyViolation(#[from] PolicyViolation),

    /// The backing store failed. The store's detail is passed through.
    ///
    /// Returns HTTP 503 Service Unavailable. Never retried internally.
    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    Validation(String),

    /// Addressed credential does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("{0} not found")]
    NotFound(String),
}

impl AppError {
    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthorizationDenied => "authorization_denied",
            AppError::PolicyViolation(_) => "policy_violation",
            AppError::Persistence(_) => "persistence_error",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthorizationDenied => StatusCode::UNAUTHORIZED,
            AppError::PolicyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "success": false,
///   "error": {
///     "code": "policy_violation",
///     "message": "Write operation 'DROP' is not allowed. Queries are read-only."
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Persistence(ref err) = self {
            tracing::error!(error = %err, "store failure");
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        }));

        (self.status(), body).into_response()
    }
}
