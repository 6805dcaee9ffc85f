// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (schema violation)
    Validation(String),

    // 400 Bad Request (illegal lifecycle operation, e.g. editing a published listing)
    InvalidTransition(String),

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden (authenticated but wrong role or not the resource owner)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (duplicate email, already favorited, lost version race)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON envelope with the appropriate HTTP status.
/// Internal errors are logged and never leak details to the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidTransition(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries. Unique-constraint
/// violations are translated at the query site, not here.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Serialization failures happen while building responses from rows we
/// already validated, so they are server faults, not client errors.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// True if a sqlx error is a unique-constraint violation.
/// Postgres error code for unique violation is 23505.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    let msg = err.to_string();
    msg.contains("unique constraint") || msg.contains("23505")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failures_are_internal_errors() {
        let err = serde_json::from_str::<i64>("not a number").unwrap_err();
        assert!(matches!(
            AppError::from(err),
            AppError::InternalServerError(_)
        ));
    }
}
