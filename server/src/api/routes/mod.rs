//! API route modules

pub mod auth;
pub mod health;
pub mod progress;
pub mod students;
pub mod subjects;
pub mod users;
