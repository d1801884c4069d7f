//! Curriculum API endpoints
//!
//! Subjects contain units, units contain topics. Every unit- or
//! topic-scoped route re-validates the ownership chain from the URL path
//! before mutating anything. Reads are open to all authenticated roles;
//! writes require staff.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::auth::Auth;
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::data::SqliteService;
use crate::data::sqlite::repositories::{subject, topic, unit};
use crate::data::types::{SubjectTree, TopicRow, UnitRow, UnitTree};
use crate::domain::access;

#[derive(Debug, Serialize, ToSchema)]
pub struct TopicDto {
    pub id: String,
    pub unit_id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<TopicRow> for TopicDto {
    fn from(row: TopicRow) -> Self {
        Self {
            id: row.id,
            unit_id: row.unit_id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnitDto {
    pub id: String,
    pub subject_id: String,
    pub name: String,
    pub topics: Vec<TopicDto>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<UnitRow> for UnitDto {
    fn from(row: UnitRow) -> Self {
        Self {
            id: row.id,
            subject_id: row.subject_id,
            name: row.name,
            topics: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<UnitTree> for UnitDto {
    fn from(tree: UnitTree) -> Self {
        let mut dto = UnitDto::from(tree.unit);
        dto.topics = tree.topics.into_iter().map(TopicDto::from).collect();
        dto
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectDto {
    pub id: String,
    pub name: String,
    pub units: Vec<UnitDto>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<SubjectTree> for SubjectDto {
    fn from(tree: SubjectTree) -> Self {
        Self {
            id: tree.subject.id,
            name: tree.subject.name,
            units: tree.units.into_iter().map(UnitDto::from).collect(),
            created_at: tree.subject.created_at,
            updated_at: tree.subject.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NameRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

/// Shared state for Curriculum API endpoints
#[derive(Clone)]
pub struct SubjectsApiState {
    pub database: Arc<SqliteService>,
}

/// Build Curriculum API routes
pub fn routes(database: Arc<SqliteService>) -> Router<()> {
    let state = SubjectsApiState { database };

    Router::new()
        .route("/", get(list_subjects).post(create_subject))
        .route(
            "/{subject_id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
        .route("/{subject_id}/units", post(add_unit))
        .route(
            "/{subject_id}/units/{unit_id}",
            put(update_unit).delete(delete_unit),
        )
        .route("/{subject_id}/units/{unit_id}/topics", post(add_topic))
        .route(
            "/{subject_id}/units/{unit_id}/topics/{topic_id}",
            put(update_topic).delete(delete_topic),
        )
        .with_state(state)
}

fn require_staff(auth: &Auth) -> Result<(), ApiError> {
    if access::can_manage_curriculum(auth.caller.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires admin privileges",
        ))
    }
}

/// Whitespace-only names pass the length validator but are still blank
fn non_blank(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("NAME_REQUIRED", "Name cannot be blank"));
    }
    Ok(trimmed)
}

/// Verify the unit belongs to the subject named in the path
async fn resolve_owned_unit(
    database: &SqliteService,
    subject_id: &str,
    unit_id: &str,
) -> Result<UnitRow, ApiError> {
    unit::get_unit_in_subject(database.pool(), subject_id, unit_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| {
            ApiError::not_found(
                "UNIT_NOT_FOUND",
                "Unit not found or does not belong to the subject",
            )
        })
}

/// List all subjects with their units and topics
#[utoipa::path(
    get,
    path = "/api/v1/subjects",
    tag = "subjects",
    responses(
        (status = 200, description = "All subjects with nested units and topics", body = [SubjectDto])
    )
)]
pub async fn list_subjects(
    State(state): State<SubjectsApiState>,
    _auth: Auth,
) -> Result<Json<Vec<SubjectDto>>, ApiError> {
    let trees = subject::list_subject_trees(state.database.pool())
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(trees.into_iter().map(SubjectDto::from).collect()))
}

/// Get one subject with its units and topics
#[utoipa::path(
    get,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(("subject_id" = String, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject with nested units and topics", body = SubjectDto),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn get_subject(
    State(state): State<SubjectsApiState>,
    _auth: Auth,
    Path(subject_id): Path<String>,
) -> Result<Json<SubjectDto>, ApiError> {
    let tree = subject::get_subject_tree(state.database.pool(), &subject_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("SUBJECT_NOT_FOUND", "Subject not found"))?;

    Ok(Json(SubjectDto::from(tree)))
}

/// Create a subject (staff only)
#[utoipa::path(
    post,
    path = "/api/v1/subjects",
    tag = "subjects",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectDto),
        (status = 403, description = "Requires staff privileges")
    )
)]
pub async fn create_subject(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    ValidatedJson(request): ValidatedJson<NameRequest>,
) -> Result<(StatusCode, Json<SubjectDto>), ApiError> {
    require_staff(&auth)?;

    let created = subject::create_subject(state.database.pool(), non_blank(&request.name)?)
        .await
        .map_err(ApiError::from_data)?;

    Ok((
        StatusCode::CREATED,
        Json(SubjectDto {
            id: created.id,
            name: created.name,
            units: Vec::new(),
            created_at: created.created_at,
            updated_at: created.updated_at,
        }),
    ))
}

/// Rename a subject (staff only)
#[utoipa::path(
    put,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(("subject_id" = String, Path, description = "Subject ID")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectDto),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn update_subject(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path(subject_id): Path<String>,
    ValidatedJson(request): ValidatedJson<NameRequest>,
) -> Result<Json<SubjectDto>, ApiError> {
    require_staff(&auth)?;

    subject::update_subject(state.database.pool(), &subject_id, non_blank(&request.name)?)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("SUBJECT_NOT_FOUND", "Subject not found"))?;

    let tree = subject::get_subject_tree(state.database.pool(), &subject_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("SUBJECT_NOT_FOUND", "Subject not found"))?;

    Ok(Json(SubjectDto::from(tree)))
}

/// Delete a subject and all units and topics under it (staff only)
#[utoipa::path(
    delete,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(("subject_id" = String, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject and all related units and topics deleted"),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn delete_subject(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path(subject_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_staff(&auth)?;

    let deleted = subject::delete_subject(state.database.pool(), &subject_id)
        .await
        .map_err(ApiError::from_data)?;
    if !deleted {
        return Err(ApiError::not_found("SUBJECT_NOT_FOUND", "Subject not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Subject and all related units and topics deleted successfully"
    })))
}

/// Add a unit to a subject (staff only)
#[utoipa::path(
    post,
    path = "/api/v1/subjects/{subject_id}/units",
    tag = "subjects",
    params(("subject_id" = String, Path, description = "Subject ID")),
    request_body = NameRequest,
    responses(
        (status = 201, description = "Unit created", body = UnitDto),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn add_unit(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path(subject_id): Path<String>,
    ValidatedJson(request): ValidatedJson<NameRequest>,
) -> Result<(StatusCode, Json<UnitDto>), ApiError> {
    require_staff(&auth)?;

    let created = unit::add_unit(state.database.pool(), &subject_id, non_blank(&request.name)?)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("SUBJECT_NOT_FOUND", "Subject not found"))?;

    Ok((StatusCode::CREATED, Json(UnitDto::from(created))))
}

/// Rename a unit (staff only)
#[utoipa::path(
    put,
    path = "/api/v1/subjects/{subject_id}/units/{unit_id}",
    tag = "subjects",
    params(
        ("subject_id" = String, Path, description = "Subject ID"),
        ("unit_id" = String, Path, description = "Unit ID")
    ),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Unit updated", body = UnitDto),
        (status = 404, description = "Unit not found or does not belong to the subject")
    )
)]
pub async fn update_unit(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path((subject_id, unit_id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<NameRequest>,
) -> Result<Json<UnitDto>, ApiError> {
    require_staff(&auth)?;

    let updated = unit::update_unit(
        state.database.pool(),
        &subject_id,
        &unit_id,
        non_blank(&request.name)?,
    )
    .await
    .map_err(ApiError::from_data)?
    .ok_or_else(|| {
        ApiError::not_found(
            "UNIT_NOT_FOUND",
            "Unit not found or does not belong to the subject",
        )
    })?;

    Ok(Json(UnitDto::from(updated)))
}

/// Delete a unit and its topics (staff only)
#[utoipa::path(
    delete,
    path = "/api/v1/subjects/{subject_id}/units/{unit_id}",
    tag = "subjects",
    params(
        ("subject_id" = String, Path, description = "Subject ID"),
        ("unit_id" = String, Path, description = "Unit ID")
    ),
    responses(
        (status = 200, description = "Unit and all related topics deleted"),
        (status = 404, description = "Unit not found or does not belong to the subject")
    )
)]
pub async fn delete_unit(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path((subject_id, unit_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_staff(&auth)?;

    let deleted = unit::delete_unit(state.database.pool(), &subject_id, &unit_id)
        .await
        .map_err(ApiError::from_data)?;
    if !deleted {
        return Err(ApiError::not_found(
            "UNIT_NOT_FOUND",
            "Unit not found or does not belong to the subject",
        ));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Unit and all related topics deleted successfully"
    })))
}

/// Add a topic to a unit (staff only)
#[utoipa::path(
    post,
    path = "/api/v1/subjects/{subject_id}/units/{unit_id}/topics",
    tag = "subjects",
    params(
        ("subject_id" = String, Path, description = "Subject ID"),
        ("unit_id" = String, Path, description = "Unit ID")
    ),
    request_body = NameRequest,
    responses(
        (status = 201, description = "Topic created", body = TopicDto),
        (status = 404, description = "Unit not found or does not belong to the subject"),
        (status = 409, description = "A topic with this name already exists in this unit")
    )
)]
pub async fn add_topic(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path((subject_id, unit_id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<NameRequest>,
) -> Result<(StatusCode, Json<TopicDto>), ApiError> {
    require_staff(&auth)?;

    let owned = resolve_owned_unit(&state.database, &subject_id, &unit_id).await?;

    let created = topic::add_topic(state.database.pool(), &owned.id, non_blank(&request.name)?)
        .await
        .map_err(ApiError::from_data)?;

    Ok((StatusCode::CREATED, Json(TopicDto::from(created))))
}

/// Rename a topic (staff only)
#[utoipa::path(
    put,
    path = "/api/v1/subjects/{subject_id}/units/{unit_id}/topics/{topic_id}",
    tag = "subjects",
    params(
        ("subject_id" = String, Path, description = "Subject ID"),
        ("unit_id" = String, Path, description = "Unit ID"),
        ("topic_id" = String, Path, description = "Topic ID")
    ),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Topic updated", body = TopicDto),
        (status = 404, description = "Topic not found or ownership chain broken"),
        (status = 409, description = "A topic with this name already exists in this unit")
    )
)]
pub async fn update_topic(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path((subject_id, unit_id, topic_id)): Path<(String, String, String)>,
    ValidatedJson(request): ValidatedJson<NameRequest>,
) -> Result<Json<TopicDto>, ApiError> {
    require_staff(&auth)?;

    resolve_owned_unit(&state.database, &subject_id, &unit_id).await?;

    let updated = topic::update_topic(
        state.database.pool(),
        &unit_id,
        &topic_id,
        non_blank(&request.name)?,
    )
    .await
    .map_err(ApiError::from_data)?
    .ok_or_else(|| {
        ApiError::not_found(
            "TOPIC_NOT_FOUND",
            "Topic not found or does not belong to the unit",
        )
    })?;

    Ok(Json(TopicDto::from(updated)))
}

/// Delete a topic and its progress records (staff only)
#[utoipa::path(
    delete,
    path = "/api/v1/subjects/{subject_id}/units/{unit_id}/topics/{topic_id}",
    tag = "subjects",
    params(
        ("subject_id" = String, Path, description = "Subject ID"),
        ("unit_id" = String, Path, description = "Unit ID"),
        ("topic_id" = String, Path, description = "Topic ID")
    ),
    responses(
        (status = 200, description = "Topic deleted"),
        (status = 404, description = "Topic not found or ownership chain broken")
    )
)]
pub async fn delete_topic(
    State(state): State<SubjectsApiState>,
    auth: Auth,
    Path((subject_id, unit_id, topic_id)): Path<(String, String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_staff(&auth)?;

    resolve_owned_unit(&state.database, &subject_id, &unit_id).await?;

    let deleted = topic::delete_topic(state.database.pool(), &unit_id, &topic_id)
        .await
        .map_err(ApiError::from_data)?;
    if !deleted {
        return Err(ApiError::not_found(
            "TOPIC_NOT_FOUND",
            "Topic not found or does not belong to the unit",
        ));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Topic deleted successfully"
    })))
}
