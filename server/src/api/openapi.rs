//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{auth, health, progress, students, subjects, users};
use crate::data::types::{ProgressStatus, Role};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Studyline API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Student progress tracking server"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "students", description = "Student management"),
        (name = "subjects", description = "Curriculum management"),
        (name = "progress", description = "Progress tracking")
    ),
    paths(
        // Health
        health::health,
        // Auth
        auth::setup,
        auth::login,
        auth::register,
        auth::refresh_token,
        auth::logout,
        auth::get_me,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Students
        students::list_students,
        students::get_student,
        students::create_student,
        students::update_student,
        students::delete_student,
        // Subjects
        subjects::list_subjects,
        subjects::get_subject,
        subjects::create_subject,
        subjects::update_subject,
        subjects::delete_subject,
        subjects::add_unit,
        subjects::update_unit,
        subjects::delete_unit,
        subjects::add_topic,
        subjects::update_topic,
        subjects::delete_topic,
        // Progress
        progress::student_progress,
        progress::student_subject_progress,
        progress::recent_progress,
        progress::upsert_progress,
    ),
    components(schemas(
        // Enums
        Role,
        ProgressStatus,
        // Health
        health::HealthResponse,
        // Auth
        auth::LoginRequest,
        auth::SetupRequest,
        auth::RegisterRequest,
        auth::RefreshRequest,
        auth::SessionUser,
        auth::SessionResponse,
        auth::RefreshResponse,
        // Users
        users::UserDto,
        users::CreateUserRequest,
        users::UpdateUserRequest,
        // Students
        students::StudentDto,
        students::CreateStudentRequest,
        students::UpdateStudentRequest,
        // Subjects
        subjects::SubjectDto,
        subjects::UnitDto,
        subjects::TopicDto,
        subjects::NameRequest,
        // Progress
        progress::ProgressDto,
        progress::UpsertProgressRequest,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Studyline API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true
            });
        };
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/v1/progress"));
        assert!(json.contains("/api/v1/subjects"));
    }
}
