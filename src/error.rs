//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.
//!
//! Business rejections of attendance actions are not errors: they travel as
//! `200 OK` bodies with a numeric result code (see `models::attendance`).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Authentication**: missing/invalid API key or session token (401)
/// - **Authorization**: origin, IP, device or ownership mismatch (403)
/// - **Rate limiting**: per-minute quota or login block exceeded (429)
/// - **Validation**: malformed or missing request fields (400)
/// - **Conflict / PolicyDenied**: business rules outside the attendance codes (400)
/// - **NotFound**: unknown employee or record (404)
/// - **Database / Internal**: storage or network faults (500, details hidden)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session token could not be decoded or validated.
    #[error("Invalid session token")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Credential header or session token is missing or invalid.
    #[error("{0}")]
    Authentication(String),

    /// Caller is authenticated but not allowed to perform this request.
    #[error("{0}")]
    Authorization(String),

    /// Too many requests within the current window.
    #[error("{0}")]
    RateLimitExceeded(String),

    /// Request body or parameters are invalid.
    #[error("{0}")]
    Validation(String),

    /// The action duplicates one already recorded.
    #[error("{0}")]
    Conflict(String),

    /// The action is not permitted at the current server time.
    ///
    /// Carries the server time so clients can show why they were refused.
    #[error("{message}")]
    PolicyDenied { message: String, server_time: String },

    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Any other fault; the message is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return the common envelope:
/// ```json
/// {
///   "success": false,
///   "message": "Human-readable error message"
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `Authentication`, `Token` → 401 Unauthorized
/// - `Authorization` → 403 Forbidden
/// - `RateLimitExceeded` → 429 Too Many Requests
/// - `Validation`, `Conflict`, `PolicyDenied` → 400 Bad Request
/// - `NotFound` → 404 Not Found
/// - `Database`, `Internal` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Authentication(_) | AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Validation(_) | AppError::Conflict(_) | AppError::PolicyDenied { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                json!({ "success": false, "message": "An internal error occurred" })
            }
            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                json!({ "success": false, "message": "An internal error occurred" })
            }
            AppError::Token(ref e) => {
                tracing::debug!(error = %e, "session token rejected");
                json!({ "success": false, "message": self.to_string() })
            }
            AppError::PolicyDenied {
                ref message,
                ref server_time,
            } => json!({
                "success": false,
                "message": message,
                "server_time": server_time,
            }),
            other => json!({ "success": false, "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
