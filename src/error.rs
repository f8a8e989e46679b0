//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Storage Errors**: database or store failures, never shown to clients
/// - **Authentication Errors**: invalid or missing API keys
/// - **Resource Errors**: requested entity absent or owned by another user
/// - **Validation Errors**: malformed or out-of-range request data
/// - **Integrity Errors**: a stored reference points at something that no longer exists
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database store failure (in-memory backend).
    #[error("Storage error: {0}")]
    Storage(String),

    /// API key is missing, invalid, or belongs to an inactive user.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Account does not exist or belongs to another user.
    #[error("Account not found")]
    AccountNotFound,

    /// Category does not exist or belongs to another user.
    #[error("Category not found")]
    CategoryNotFound,

    /// Transaction does not exist or belongs to another user.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// Financial goal does not exist or belongs to another user.
    #[error("Financial goal not found")]
    GoalNotFound,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Operation would break a reference held by other records.
    #[error("Conflict")]
    Conflict(String),

    /// Stored data violates a referential invariant, e.g. a transaction
    /// points at an account that no longer exists.
    ///
    /// This is not recoverable by the caller and maps to HTTP 500.
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidApiKey` → 401 Unauthorized
/// - `*NotFound` → 404 Not Found
/// - `InvalidRequest` → 400 Bad Request
/// - `Conflict` → 409 Conflict
/// - `Inconsistent` → 500 Internal Server Error
/// - `Database` / `Storage` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                self.to_string(),
            ),
            AppError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::CategoryNotFound => {
                (StatusCode::NOT_FOUND, "category_not_found", self.to_string())
            }
            AppError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                self.to_string(),
            ),
            AppError::GoalNotFound => (StatusCode::NOT_FOUND, "goal_not_found", self.to_string()),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Inconsistent(ref msg) => {
                tracing::error!("inconsistent state: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "inconsistent_state",
                    "Stored data is inconsistent".to_string(),
                )
            }
            AppError::Database(ref err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Storage(ref msg) => {
                tracing::error!("storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_api_key_maps_to_401() {
        let res = AppError::InvalidApiKey.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn not_found_variants_map_to_404() {
        for err in [
            AppError::AccountNotFound,
            AppError::CategoryNotFound,
            AppError::TransactionNotFound,
            AppError::GoalNotFound,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let res = AppError::InvalidRequest("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_maps_to_409() {
        let res = AppError::Conflict("in use".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn inconsistent_state_maps_to_500() {
        let res = AppError::Inconsistent("dangling account".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn storage_failure_maps_to_500() {
        let res = AppError::Storage("boom".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
