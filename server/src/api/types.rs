//! Shared API types
//!
//! Typed error responses used across all endpoints. The variants map 1:1 to
//! the HTTP status codes the boundary emits; internal detail never leaks
//! into response bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::sqlite::SqliteError;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    Unauthorized { code: String, message: String },
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map a data-layer error; uniqueness conflicts keep their message,
    /// everything else is logged and hidden behind a generic 500.
    pub fn from_data(e: SqliteError) -> Self {
        match e {
            SqliteError::Conflict(message) => Self::Conflict {
                code: "CONFLICT".to_string(),
                message,
            },
            other => {
                tracing::error!(error = %other, "Data error");
                Self::Internal {
                    message: "Database operation failed".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", code, message)
            }
            Self::Forbidden { code, message } => {
                (StatusCode::FORBIDDEN, "forbidden", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, "conflict", code, message),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_from_data_keeps_message() {
        let err = ApiError::from_data(SqliteError::Conflict("Email already in use".into()));
        match err {
            ApiError::Conflict { message, .. } => assert_eq!(message, "Email already in use"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_database_errors_are_hidden() {
        let err = ApiError::from_data(SqliteError::Database(sqlx::Error::PoolClosed));
        match err {
            ApiError::Internal { message } => assert_eq!(message, "Database operation failed"),
            other => panic!("expected Internal, got {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::bad_request("X", "m").into_response().status(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::unauthorized("X", "m").into_response().status(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::forbidden("X", "m").into_response().status(),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::not_found("X", "m").into_response().status(),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::conflict("X", "m").into_response().status(),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::internal("m").into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (actual, expected) in cases {
            assert_eq!(actual, expected);
        }
    }
}
