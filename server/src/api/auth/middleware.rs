//! Authentication middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde_json::json;

use super::jwt::JwtError;
use super::manager::AuthManager;
use crate::core::constants::ACCESS_COOKIE_NAME;
use crate::domain::Caller;

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub error: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "AUTH_REQUIRED",
            message: "Authentication required".to_string(),
        }
    }

    pub fn expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_EXPIRED",
            message: "Token has expired".to_string(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_INVALID",
            message: "Invalid token".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub auth_manager: Arc<AuthManager>,
}

/// Authentication middleware
///
/// Accepts the access token from the Authorization header (`Bearer ...`) or
/// the access cookie, header first. Injects the verified `Caller` into
/// request extensions for the `Auth` extractor.
pub async fn require_auth(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = match bearer {
        Some(token) => token,
        None => jar
            .get(ACCESS_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or_else(AuthError::required)?,
    };

    let claims = state.auth_manager.validate_access(&token).map_err(|e| match e {
        JwtError::Expired => AuthError::expired(),
        _ => AuthError::invalid(),
    })?;

    let caller = Caller {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    };
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}
