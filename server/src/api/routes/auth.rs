//! Authentication API endpoints
//!
//! Login issues a short-lived access token and a longer-lived refresh token
//! as HttpOnly cookies (the access token is also returned in the body for
//! non-browser clients). Setup creates the one initial super admin and only
//! works while the user table is empty.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::auth::{Auth, AuthManager, AuthState, TokenPair, require_auth};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::core::constants::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
use crate::data::SqliteService;
use crate::data::sqlite::repositories::user;
use crate::data::types::Role;
use crate::utils::password::{hash_password, verify_password};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Defaults to the parent role; registering a super admin is not allowed
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    /// Falls back to the refresh cookie when omitted
    pub refresh_token: Option<String>,
}

/// User info in auth responses
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub children: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: SessionUser,
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Auth routes state
#[derive(Clone)]
pub struct AuthRoutesState {
    pub auth_manager: Arc<AuthManager>,
    pub database: Arc<SqliteService>,
}

/// Create auth routes
pub fn routes(auth_manager: Arc<AuthManager>, database: Arc<SqliteService>) -> Router<()> {
    let state = AuthRoutesState {
        auth_manager: auth_manager.clone(),
        database,
    };

    let public = Router::new()
        .route("/setup", post(setup))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/me", get(get_me))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            AuthState { auth_manager },
            require_auth,
        ));

    public.merge(protected)
}

fn session_cookies(manager: &AuthManager, pair: &TokenPair) -> (Cookie<'static>, Cookie<'static>) {
    let access = Cookie::build((ACCESS_COOKIE_NAME, pair.access_token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/api")
        .max_age(time::Duration::seconds(manager.access_ttl().num_seconds()))
        .build();

    let refresh = Cookie::build((REFRESH_COOKIE_NAME, pair.refresh_token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/api")
        .max_age(time::Duration::seconds(manager.refresh_ttl().num_seconds()))
        .build();

    (access, refresh)
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/api")
        .max_age(time::Duration::seconds(0))
        .build()
}

async fn session_user(
    database: &SqliteService,
    user: &crate::data::types::UserRow,
) -> Result<SessionUser, ApiError> {
    let children = user::children_ids(database.pool(), &user.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(SessionUser {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        children,
    })
}

/// Create the first super admin (only while no users exist)
#[utoipa::path(
    post,
    path = "/api/v1/auth/setup",
    tag = "auth",
    request_body = SetupRequest,
    responses(
        (status = 201, description = "First super admin created", body = SessionResponse),
        (status = 409, description = "Setup already completed")
    )
)]
pub async fn setup(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<SetupRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), ApiError> {
    let password_hash =
        hash_password(&request.password).map_err(|_| ApiError::internal("Failed to hash password"))?;

    let created = user::create_initial_super_admin(
        state.database.pool(),
        &request.name,
        &request.email,
        &password_hash,
    )
    .await
    .map_err(ApiError::from_data)?;

    tracing::info!(user_id = %created.id, "Initial super admin created");

    let pair = state
        .auth_manager
        .issue_tokens(&created)
        .map_err(|_| ApiError::internal("Failed to issue tokens"))?;
    let (access, refresh) = session_cookies(&state.auth_manager, &pair);

    let response = SessionResponse {
        user: session_user(&state.database, &created).await?,
        access_token: pair.access_token,
    };

    Ok((
        StatusCode::CREATED,
        jar.add(access).add(refresh),
        Json(response),
    ))
}

/// Authenticate a user and issue a token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    let found = user::get_by_email(state.database.pool(), &request.email)
        .await
        .map_err(ApiError::from_data)?;

    // Same response for unknown email and wrong password
    let Some(account) = found else {
        return Err(ApiError::unauthorized(
            "LOGIN_FAILED",
            "Invalid email or password",
        ));
    };
    if !verify_password(&request.password, &account.password_hash) {
        return Err(ApiError::unauthorized(
            "LOGIN_FAILED",
            "Invalid email or password",
        ));
    }

    let pair = state
        .auth_manager
        .issue_tokens(&account)
        .map_err(|_| ApiError::internal("Failed to issue tokens"))?;
    let (access, refresh) = session_cookies(&state.auth_manager, &pair);

    let response = SessionResponse {
        user: session_user(&state.database, &account).await?,
        access_token: pair.access_token,
    };

    Ok((jar.add(access).add(refresh), Json(response)))
}

/// Register a new account (parent by default, teacher with role=admin)
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), ApiError> {
    let role = request.role.unwrap_or(Role::Parent);
    if role == Role::SuperAdmin {
        return Err(ApiError::bad_request(
            "INVALID_ROLE",
            "Cannot register a super admin account",
        ));
    }

    let password_hash =
        hash_password(&request.password).map_err(|_| ApiError::internal("Failed to hash password"))?;

    let created = user::create_user(
        state.database.pool(),
        &request.name,
        &request.email,
        &password_hash,
        role,
    )
    .await
    .map_err(ApiError::from_data)?;

    let pair = state
        .auth_manager
        .issue_tokens(&created)
        .map_err(|_| ApiError::internal("Failed to issue tokens"))?;
    let (access, refresh) = session_cookies(&state.auth_manager, &pair);

    let response = SessionResponse {
        user: session_user(&state.database, &created).await?,
        access_token: pair.access_token,
    };

    Ok((
        StatusCode::CREATED,
        jar.add(access).add(refresh),
        Json(response),
    ))
}

/// Exchange a valid refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh-token",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = RefreshResponse),
        (status = 401, description = "Missing, invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let token = request
        .refresh_token
        .or_else(|| jar.get(REFRESH_COOKIE_NAME).map(|c| c.value().to_string()))
        .ok_or_else(|| {
            ApiError::unauthorized("REFRESH_REQUIRED", "No refresh token provided")
        })?;

    let claims = state
        .auth_manager
        .validate_refresh(&token)
        .map_err(|_| ApiError::unauthorized("REFRESH_INVALID", "Invalid or expired refresh token"))?;

    // The account may have been deleted or changed since the token was issued
    let account = user::get_user(state.database.pool(), claims.user_id())
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::unauthorized("REFRESH_INVALID", "User no longer exists"))?;

    let pair = state
        .auth_manager
        .issue_tokens(&account)
        .map_err(|_| ApiError::internal("Failed to issue tokens"))?;
    let (access, refresh) = session_cookies(&state.auth_manager, &pair);

    Ok((
        jar.add(access).add(refresh),
        Json(RefreshResponse {
            access_token: pair.access_token,
        }),
    ))
}

/// Logout - clear both session cookies
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out successfully")
    )
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.remove(expired_cookie(ACCESS_COOKIE_NAME))
            .remove(expired_cookie(REFRESH_COOKIE_NAME)),
        Json(serde_json::json!({
            "success": true,
            "message": "Logged out successfully"
        })),
    )
}

/// Get the current caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = SessionUser),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    State(state): State<AuthRoutesState>,
    auth: Auth,
) -> Result<Json<SessionUser>, ApiError> {
    let account = user::get_user(state.database.pool(), &auth.caller.id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    Ok(Json(session_user(&state.database, &account).await?))
}
