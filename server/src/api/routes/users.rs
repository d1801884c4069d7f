//! User management API endpoints
//!
//! Listing, creating, updating and deleting accounts is reserved for the
//! super admin; every other caller may only view their own record.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::auth::Auth;
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::data::SqliteService;
use crate::data::sqlite::repositories::user;
use crate::data::types::{Role, UserRow};
use crate::domain::access;
use crate::utils::password::hash_password;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub children: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Shared state for Users API endpoints
#[derive(Clone)]
pub struct UsersApiState {
    pub database: Arc<SqliteService>,
}

/// Build Users API routes
pub fn routes(database: Arc<SqliteService>) -> Router<()> {
    let state = UsersApiState { database };

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
}

async fn to_dto(database: &SqliteService, row: UserRow) -> Result<UserDto, ApiError> {
    let children = user::children_ids(database.pool(), &row.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(UserDto {
        id: row.id,
        name: row.name,
        email: row.email,
        role: row.role,
        children,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// List all users (super admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserDto]),
        (status = 403, description = "Requires super admin")
    )
)]
pub async fn list_users(
    State(state): State<UsersApiState>,
    auth: Auth,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    if !access::can_list_users(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires super admin privileges",
        ));
    }

    let rows = user::list_users(state.database.pool())
        .await
        .map_err(ApiError::from_data)?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        users.push(to_dto(&state.database, row).await?);
    }

    Ok(Json(users))
}

/// Get a user by ID (self or super admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User record", body = UserDto),
        (status = 403, description = "Not your record"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<UsersApiState>,
    auth: Auth,
    Path(user_id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    if !access::can_view_user(&auth.caller, &user_id) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "You can only view your own account",
        ));
    }

    let row = user::get_user(state.database.pool(), &user_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    Ok(Json(to_dto(&state.database, row).await?))
}

/// Create a user (super admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 403, description = "Requires super admin"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_user(
    State(state): State<UsersApiState>,
    auth: Auth,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    if !access::can_manage_users(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires super admin privileges",
        ));
    }

    let password_hash =
        hash_password(&request.password).map_err(|_| ApiError::internal("Failed to hash password"))?;

    let created = user::create_user(
        state.database.pool(),
        &request.name,
        &request.email,
        &password_hash,
        request.role.unwrap_or(Role::Parent),
    )
    .await
    .map_err(ApiError::from_data)?;

    Ok((
        StatusCode::CREATED,
        Json(to_dto(&state.database, created).await?),
    ))
}

/// Update a user's name, email or role (super admin only)
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserDto),
        (status = 403, description = "Requires super admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<UsersApiState>,
    auth: Auth,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    if !access::can_manage_users(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires super admin privileges",
        ));
    }

    let updated = user::update_user(
        state.database.pool(),
        &user_id,
        request.name.as_deref(),
        request.email.as_deref(),
        request.role,
    )
    .await
    .map_err(ApiError::from_data)?
    .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    Ok(Json(to_dto(&state.database, updated).await?))
}

/// Delete a user (super admin only; never your own account)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Requires super admin, or tried to delete self"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<UsersApiState>,
    auth: Auth,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !access::can_manage_users(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires super admin privileges",
        ));
    }
    if auth.caller.id == user_id {
        return Err(ApiError::forbidden(
            "SELF_DELETE",
            "You cannot delete your own account",
        ));
    }

    let deleted = user::delete_user(state.database.pool(), &user_id)
        .await
        .map_err(ApiError::from_data)?;
    if !deleted {
        return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}
