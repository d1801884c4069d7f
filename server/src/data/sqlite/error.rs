//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl SqliteError {
    /// Map a unique-constraint violation to a typed conflict, preserving
    /// other database errors unchanged.
    pub fn or_conflict(e: sqlx::Error, message: &str) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(message.to_string())
            }
            _ => Self::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failed_error_display() {
        let err = SqliteError::MigrationFailed {
            version: 2,
            name: "add_notes_to_progress".to_string(),
            error: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 2 (add_notes_to_progress) failed: syntax error"
        );
    }

    #[test]
    fn test_conflict_display() {
        let err = SqliteError::Conflict("Email already in use".to_string());
        assert_eq!(err.to_string(), "Conflict: Email already in use");
    }

    #[test]
    fn test_or_conflict_keeps_non_unique_errors() {
        let err = SqliteError::or_conflict(sqlx::Error::PoolClosed, "duplicate");
        assert!(matches!(err, SqliteError::Database(_)));
    }
}
