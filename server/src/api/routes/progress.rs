//! Progress API endpoints
//!
//! Reads go through the same student-access rule as the student routes;
//! the single write path is the staff-only upsert.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::students::ensure_student_access;
use crate::api::auth::Auth;
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::core::constants::RECENT_PROGRESS_LIMIT;
use crate::data::SqliteService;
use crate::data::sqlite::repositories::{progress, topic};
use crate::data::types::{ProgressRow, ProgressStatus, Role};
use crate::domain::access;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressDto {
    pub id: String,
    pub student_id: String,
    pub topic_id: String,
    pub status: ProgressStatus,
    pub notes: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<ProgressRow> for ProgressDto {
    fn from(row: ProgressRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            topic_id: row.topic_id,
            status: row.status,
            notes: row.notes,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertProgressRequest {
    #[validate(length(min = 1, message = "student_id is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "topic_id is required"))]
    pub topic_id: String,
    /// One of: not_studied, started, difficult, ok, confident
    pub status: ProgressStatus,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Shared state for Progress API endpoints
#[derive(Clone)]
pub struct ProgressApiState {
    pub database: Arc<SqliteService>,
}

/// Build Progress API routes
pub fn routes(database: Arc<SqliteService>) -> Router<()> {
    let state = ProgressApiState { database };

    Router::new()
        .route("/", post(upsert_progress))
        .route("/recent", get(recent_progress))
        .route("/student/{student_id}", get(student_progress))
        .route(
            "/student/{student_id}/subject/{subject_id}",
            get(student_subject_progress),
        )
        .with_state(state)
}

/// All progress for one student
#[utoipa::path(
    get,
    path = "/api/v1/progress/student/{student_id}",
    tag = "progress",
    params(("student_id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Progress records", body = [ProgressDto]),
        (status = 403, description = "Not your child")
    )
)]
pub async fn student_progress(
    State(state): State<ProgressApiState>,
    auth: Auth,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<ProgressDto>>, ApiError> {
    let student = ensure_student_access(&state.database, &auth.caller, &student_id).await?;

    let rows = progress::list_for_student(state.database.pool(), &student.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(rows.into_iter().map(ProgressDto::from).collect()))
}

/// Progress for one student within one subject
///
/// Joins through the live curriculum tree, so records for topics that have
/// been moved or deleted do not appear.
#[utoipa::path(
    get,
    path = "/api/v1/progress/student/{student_id}/subject/{subject_id}",
    tag = "progress",
    params(
        ("student_id" = String, Path, description = "Student ID"),
        ("subject_id" = String, Path, description = "Subject ID")
    ),
    responses(
        (status = 200, description = "Progress records for the subject", body = [ProgressDto]),
        (status = 403, description = "Not your child")
    )
)]
pub async fn student_subject_progress(
    State(state): State<ProgressApiState>,
    auth: Auth,
    Path((student_id, subject_id)): Path<(String, String)>,
) -> Result<Json<Vec<ProgressDto>>, ApiError> {
    let student = ensure_student_access(&state.database, &auth.caller, &student_id).await?;

    let rows =
        progress::list_for_student_and_subject(state.database.pool(), &student.id, &subject_id)
            .await
            .map_err(ApiError::from_data)?;

    Ok(Json(rows.into_iter().map(ProgressDto::from).collect()))
}

/// Latest progress updates visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/progress/recent",
    tag = "progress",
    responses(
        (status = 200, description = "Most recent progress records", body = [ProgressDto])
    )
)]
pub async fn recent_progress(
    State(state): State<ProgressApiState>,
    auth: Auth,
) -> Result<Json<Vec<ProgressDto>>, ApiError> {
    let rows = match auth.caller.role {
        Role::SuperAdmin | Role::Admin => {
            progress::list_recent(state.database.pool(), RECENT_PROGRESS_LIMIT)
                .await
                .map_err(ApiError::from_data)?
        }
        Role::Parent => progress::list_recent_for_parent(
            state.database.pool(),
            &auth.caller.id,
            RECENT_PROGRESS_LIMIT,
        )
        .await
        .map_err(ApiError::from_data)?,
    };

    Ok(Json(rows.into_iter().map(ProgressDto::from).collect()))
}

/// Create or update the progress record for a (student, topic) pair
/// (staff only)
#[utoipa::path(
    post,
    path = "/api/v1/progress",
    tag = "progress",
    request_body = UpsertProgressRequest,
    responses(
        (status = 200, description = "Progress recorded", body = ProgressDto),
        (status = 403, description = "Requires staff privileges"),
        (status = 404, description = "Student or topic not found")
    )
)]
pub async fn upsert_progress(
    State(state): State<ProgressApiState>,
    auth: Auth,
    ValidatedJson(request): ValidatedJson<UpsertProgressRequest>,
) -> Result<Json<ProgressDto>, ApiError> {
    if !access::can_record_progress(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires admin privileges",
        ));
    }

    // Existence checks before the write; the unique index and foreign keys
    // in the store are the backstop.
    let student = ensure_student_access(&state.database, &auth.caller, &request.student_id).await?;
    topic::get_topic(state.database.pool(), &request.topic_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("TOPIC_NOT_FOUND", "Topic not found"))?;

    let row = progress::upsert(
        state.database.pool(),
        &student.id,
        &request.topic_id,
        request.status,
        request.notes.as_deref(),
        Some(&auth.caller.id),
    )
    .await
    .map_err(ApiError::from_data)?;

    Ok(Json(ProgressDto::from(row)))
}
