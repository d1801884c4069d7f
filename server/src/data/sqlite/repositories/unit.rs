//! Unit repository for SQLite operations
//!
//! Every unit-scoped operation verifies the unit really belongs to the
//! claimed subject (`WHERE id = ? AND subject_id = ?`) instead of trusting
//! the URL path alone.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::UnitRow;

type UnitTuple = (String, String, String, i64, i64, i64);

fn row_from_tuple(
    (id, subject_id, name, position, created_at, updated_at): UnitTuple,
) -> UnitRow {
    UnitRow {
        id,
        subject_id,
        name,
        position,
        created_at,
        updated_at,
    }
}

const UNIT_COLUMNS: &str = "id, subject_id, name, position, created_at, updated_at";

/// Append a unit to a subject
///
/// Returns `None` if the subject does not exist. The position is the next
/// per-subject counter so listing preserves insertion order.
pub async fn add_unit(
    pool: &SqlitePool,
    subject_id: &str,
    name: &str,
) -> Result<Option<UnitRow>, SqliteError> {
    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM subjects WHERE id = ?")
        .bind(subject_id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Ok(None);
    }

    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    let position: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM units WHERE subject_id = ?",
    )
    .bind(subject_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO units (id, subject_id, name, position, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(subject_id)
    .bind(name)
    .bind(position)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(UnitRow {
        id,
        subject_id: subject_id.to_string(),
        name: name.to_string(),
        position,
        created_at: now,
        updated_at: now,
    }))
}

/// Get a unit by ID
pub async fn get_unit(pool: &SqlitePool, id: &str) -> Result<Option<UnitRow>, SqliteError> {
    let row = sqlx::query_as::<_, UnitTuple>(&format!(
        "SELECT {} FROM units WHERE id = ?",
        UNIT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_from_tuple))
}

/// Get a unit only if it belongs to the given subject
pub async fn get_unit_in_subject(
    pool: &SqlitePool,
    subject_id: &str,
    unit_id: &str,
) -> Result<Option<UnitRow>, SqliteError> {
    let row = sqlx::query_as::<_, UnitTuple>(&format!(
        "SELECT {} FROM units WHERE id = ? AND subject_id = ?",
        UNIT_COLUMNS
    ))
    .bind(unit_id)
    .bind(subject_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_from_tuple))
}

/// Rename a unit, enforcing subject ownership
pub async fn update_unit(
    pool: &SqlitePool,
    subject_id: &str,
    unit_id: &str,
    name: &str,
) -> Result<Option<UnitRow>, SqliteError> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        "UPDATE units SET name = ?, updated_at = ? WHERE id = ? AND subject_id = ?",
    )
    .bind(name)
    .bind(now)
    .bind(unit_id)
    .bind(subject_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_unit(pool, unit_id).await
}

/// Delete a unit and its topics (plus their progress rows), enforcing
/// subject ownership
pub async fn delete_unit(
    pool: &SqlitePool,
    subject_id: &str,
    unit_id: &str,
) -> Result<bool, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM progress WHERE topic_id IN (SELECT id FROM topics WHERE unit_id = ?)",
    )
    .bind(unit_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM topics WHERE unit_id = ?")
        .bind(unit_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM units WHERE id = ? AND subject_id = ?")
        .bind(unit_id)
        .bind(subject_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        // Ownership check failed; roll the topic deletes back
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}
