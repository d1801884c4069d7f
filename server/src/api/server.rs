//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use super::auth::AuthState;
use super::middleware::{self, AllowedOrigins};
use super::openapi::{openapi_json, swagger_ui_html};
use super::rate_limit::{RateLimitState, RateLimiter, rate_limit_middleware};
use super::routes::{auth, health, progress, students, subjects, users};
use crate::core::CoreApp;
use crate::core::constants::{AUTH_BODY_LIMIT, DEFAULT_BODY_LIMIT};

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);

        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(host.parse()?, port);

        let auth_state = AuthState {
            auth_manager: app.auth.clone(),
        };

        // Build auth routes (rate limited by IP - brute force protection)
        let auth_routes = auth::routes(app.auth.clone(), app.database.clone())
            .layer(DefaultBodyLimit::max(AUTH_BODY_LIMIT));
        let auth_routes = if app.config.rate_limit.enabled {
            auth_routes.layer(axum::middleware::from_fn_with_state(
                RateLimitState {
                    limiter: Arc::new(RateLimiter::new(app.config.rate_limit.auth_rpm)),
                },
                rate_limit_middleware,
            ))
        } else {
            auth_routes
        };

        // Resource routes all sit behind the auth middleware
        let users_routes = users::routes(app.database.clone()).layer(
            axum::middleware::from_fn_with_state(auth_state.clone(), super::auth::require_auth),
        );
        let students_routes = students::routes(app.database.clone()).layer(
            axum::middleware::from_fn_with_state(auth_state.clone(), super::auth::require_auth),
        );
        let subjects_routes = subjects::routes(app.database.clone()).layer(
            axum::middleware::from_fn_with_state(auth_state.clone(), super::auth::require_auth),
        );
        let progress_routes = progress::routes(app.database.clone()).layer(
            axum::middleware::from_fn_with_state(auth_state, super::auth::require_auth),
        );

        let router = Router::new()
            .route("/api/v1/health", get(health::health))
            .route("/api/openapi.json", get(openapi_json))
            .route("/api/docs", get(swagger_ui_html))
            .nest("/api/v1/auth", auth_routes)
            .nest("/api/v1/users", users_routes)
            .nest("/api/v1/students", students_routes)
            .nest("/api/v1/subjects", subjects_routes)
            .nest("/api/v1/progress", progress_routes)
            .fallback(middleware::handle_404)
            .layer(CompressionLayer::new())
            .layer(middleware::cors(&allowed_origins))
            .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on http://{}:{}", host, port);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}
