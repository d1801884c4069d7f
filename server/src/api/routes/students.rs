//! Student API endpoints
//!
//! Staff see and manage all students; parents see only their own children.
//! A missing student is reported as NotFound to staff but as Forbidden to
//! parents, so parents cannot probe for student ids.

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
use crate::data::sqlite::repositories::{student, user};
use crate::data::types::{Role, StudentRow};
use crate::domain::Caller;
use crate::domain::access;

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentDto {
    pub id: String,
    pub name: String,
    pub grade: Option<String>,
    pub parents: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 20, message = "Grade must be at most 20 characters"))]
    pub grade: Option<String>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 20, message = "Grade must be at most 20 characters"))]
    pub grade: Option<String>,
    /// When present, replaces the full parent set
    pub parent_ids: Option<Vec<String>>,
}

/// Shared state for Students API endpoints
#[derive(Clone)]
pub struct StudentsApiState {
    pub database: Arc<SqliteService>,
}

/// Build Students API routes
pub fn routes(database: Arc<SqliteService>) -> Router<()> {
    let state = StudentsApiState { database };

    Router::new()
        .route("/", get(list_students).post(create_student))
        .route(
            "/{student_id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .with_state(state)
}

async fn to_dto(database: &SqliteService, row: StudentRow) -> Result<StudentDto, ApiError> {
    let parents = student::parent_ids(database.pool(), &row.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(StudentDto {
        id: row.id,
        name: row.name,
        grade: row.grade,
        parents,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Resolve a student the caller is allowed to see
///
/// Parents get Forbidden for both foreign and non-existent students;
/// staff get NotFound when the student is absent.
pub(crate) async fn ensure_student_access(
    database: &SqliteService,
    caller: &Caller,
    student_id: &str,
) -> Result<StudentRow, ApiError> {
    let found = student::get_student(database.pool(), student_id)
        .await
        .map_err(ApiError::from_data)?;

    match found {
        Some(row) => {
            let parents = student::parent_ids(database.pool(), &row.id)
                .await
                .map_err(ApiError::from_data)?;
            if access::can_view_student(caller, &parents) {
                Ok(row)
            } else {
                Err(ApiError::forbidden(
                    "ACCESS_DENIED",
                    "You do not have access to this student",
                ))
            }
        }
        None => {
            if caller.role == Role::Parent {
                Err(ApiError::forbidden(
                    "ACCESS_DENIED",
                    "You do not have access to this student",
                ))
            } else {
                Err(ApiError::not_found("STUDENT_NOT_FOUND", "Student not found"))
            }
        }
    }
}

async fn ensure_parents_exist(
    database: &SqliteService,
    parent_ids: &[String],
) -> Result<(), ApiError> {
    for parent_id in parent_ids {
        let exists = user::get_user(database.pool(), parent_id)
            .await
            .map_err(ApiError::from_data)?
            .is_some();
        if !exists {
            return Err(ApiError::not_found(
                "PARENT_NOT_FOUND",
                format!("Parent user not found: {}", parent_id),
            ));
        }
    }
    Ok(())
}

/// List students visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/students",
    tag = "students",
    responses(
        (status = 200, description = "Visible students", body = [StudentDto])
    )
)]
pub async fn list_students(
    State(state): State<StudentsApiState>,
    auth: Auth,
) -> Result<Json<Vec<StudentDto>>, ApiError> {
    let rows = match auth.caller.role {
        Role::SuperAdmin | Role::Admin => student::list_students(state.database.pool())
            .await
            .map_err(ApiError::from_data)?,
        Role::Parent => student::list_students_for_parent(state.database.pool(), &auth.caller.id)
            .await
            .map_err(ApiError::from_data)?,
    };

    let mut students = Vec::with_capacity(rows.len());
    for row in rows {
        students.push(to_dto(&state.database, row).await?);
    }

    Ok(Json(students))
}

/// Get a student by ID
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(("student_id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student record", body = StudentDto),
        (status = 403, description = "Not your child"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<StudentsApiState>,
    auth: Auth,
    Path(student_id): Path<String>,
) -> Result<Json<StudentDto>, ApiError> {
    let row = ensure_student_access(&state.database, &auth.caller, &student_id).await?;
    Ok(Json(to_dto(&state.database, row).await?))
}

/// Create a student (staff only)
#[utoipa::path(
    post,
    path = "/api/v1/students",
    tag = "students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentDto),
        (status = 403, description = "Requires staff privileges"),
        (status = 404, description = "A referenced parent does not exist")
    )
)]
pub async fn create_student(
    State(state): State<StudentsApiState>,
    auth: Auth,
    ValidatedJson(request): ValidatedJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentDto>), ApiError> {
    if !access::can_manage_students(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires admin privileges",
        ));
    }

    ensure_parents_exist(&state.database, &request.parent_ids).await?;

    let created = student::create_student(
        state.database.pool(),
        &request.name,
        request.grade.as_deref(),
        &request.parent_ids,
    )
    .await
    .map_err(ApiError::from_data)?;

    Ok((
        StatusCode::CREATED,
        Json(to_dto(&state.database, created).await?),
    ))
}

/// Update a student; a parent_ids field reassigns the parent set (staff only)
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(("student_id" = String, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentDto),
        (status = 403, description = "Requires staff privileges"),
        (status = 404, description = "Student or referenced parent not found")
    )
)]
pub async fn update_student(
    State(state): State<StudentsApiState>,
    auth: Auth,
    Path(student_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStudentRequest>,
) -> Result<Json<StudentDto>, ApiError> {
    if !access::can_manage_students(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires admin privileges",
        ));
    }

    let updated = student::update_student(
        state.database.pool(),
        &student_id,
        request.name.as_deref(),
        request.grade.as_deref(),
    )
    .await
    .map_err(ApiError::from_data)?
    .ok_or_else(|| ApiError::not_found("STUDENT_NOT_FOUND", "Student not found"))?;

    if let Some(parent_ids) = &request.parent_ids {
        ensure_parents_exist(&state.database, parent_ids).await?;
        student::reassign_parents(state.database.pool(), &student_id, parent_ids)
            .await
            .map_err(ApiError::from_data)?;
    }

    Ok(Json(to_dto(&state.database, updated).await?))
}

/// Delete a student and their progress records (staff only)
#[utoipa::path(
    delete,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(("student_id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted"),
        (status = 403, description = "Requires staff privileges"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn delete_student(
    State(state): State<StudentsApiState>,
    auth: Auth,
    Path(student_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !access::can_manage_students(auth.caller.role) {
        return Err(ApiError::forbidden(
            "ACCESS_DENIED",
            "Requires admin privileges",
        ));
    }

    let deleted = student::delete_student(state.database.pool(), &student_id)
        .await
        .map_err(ApiError::from_data)?;
    if !deleted {
        return Err(ApiError::not_found("STUDENT_NOT_FOUND", "Student not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Student deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::setup_test_pool;

    fn caller(id: &str, role: Role) -> Caller {
        Caller {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            role,
        }
    }

    async fn test_database() -> SqliteService {
        SqliteService::from_pool(setup_test_pool().await)
    }

    #[tokio::test]
    async fn test_parent_cannot_access_foreign_student() {
        let database = test_database().await;
        let parent = user::create_user(database.pool(), "Parent", "p@x.com", "hash", Role::Parent)
            .await
            .unwrap();
        student::create_student(database.pool(), "Own child", None, &[parent.id.clone()])
            .await
            .unwrap();
        let other = student::create_student(database.pool(), "Other child", None, &[])
            .await
            .unwrap();

        let err = ensure_student_access(&database, &caller(&parent.id, Role::Parent), &other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }));

        // An admin reaches the same student
        let row = ensure_student_access(&database, &caller("staff", Role::Admin), &other.id)
            .await
            .unwrap();
        assert_eq!(row.id, other.id);
    }

    #[tokio::test]
    async fn test_parent_reaches_own_child() {
        let database = test_database().await;
        let parent = user::create_user(database.pool(), "Parent", "p@x.com", "hash", Role::Parent)
            .await
            .unwrap();
        let child = student::create_student(database.pool(), "Child", None, &[parent.id.clone()])
            .await
            .unwrap();

        let row = ensure_student_access(&database, &caller(&parent.id, Role::Parent), &child.id)
            .await
            .unwrap();
        assert_eq!(row.id, child.id);
    }

    #[tokio::test]
    async fn test_missing_student_is_forbidden_for_parents_not_found_for_staff() {
        let database = test_database().await;

        let err = ensure_student_access(&database, &caller("p1", Role::Parent), "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }));

        let err = ensure_student_access(&database, &caller("staff", Role::SuperAdmin), "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}
