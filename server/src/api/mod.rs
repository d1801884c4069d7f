//! HTTP API: server, routes, middleware and authentication

pub mod auth;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod types;

pub use auth::AuthManager;
pub use server::ApiServer;
