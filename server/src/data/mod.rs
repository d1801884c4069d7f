//! Data layer: SQLite storage, row types and repositories

pub mod seed;
pub mod sqlite;
pub mod types;

pub use sqlite::{SqliteError, SqliteService};
