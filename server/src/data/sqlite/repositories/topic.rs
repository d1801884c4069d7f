//! Topic repository for SQLite operations
//!
//! Topic names are unique within a unit; the UNIQUE(unit_id, name) index is
//! the backstop and surfaces as a typed conflict.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::TopicRow;

const DUPLICATE_TOPIC: &str = "A topic with this name already exists in this unit";

type TopicTuple = (String, String, String, i64, i64, i64);

fn row_from_tuple((id, unit_id, name, position, created_at, updated_at): TopicTuple) -> TopicRow {
    TopicRow {
        id,
        unit_id,
        name,
        position,
        created_at,
        updated_at,
    }
}

/// Append a topic to a unit
///
/// The caller is expected to have resolved the unit (and its subject
/// ownership) already; duplicate names within the unit yield `Conflict`.
pub async fn add_topic(
    pool: &SqlitePool,
    unit_id: &str,
    name: &str,
) -> Result<TopicRow, SqliteError> {
    let mut tx = pool.begin().await?;

    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    let position: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM topics WHERE unit_id = ?",
    )
    .bind(unit_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO topics (id, unit_id, name, position, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(unit_id)
    .bind(name)
    .bind(position)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| SqliteError::or_conflict(e, DUPLICATE_TOPIC))?;

    tx.commit().await?;

    Ok(TopicRow {
        id,
        unit_id: unit_id.to_string(),
        name: name.to_string(),
        position,
        created_at: now,
        updated_at: now,
    })
}

/// Get a topic by ID
pub async fn get_topic(pool: &SqlitePool, id: &str) -> Result<Option<TopicRow>, SqliteError> {
    let row = sqlx::query_as::<_, TopicTuple>(
        "SELECT id, unit_id, name, position, created_at, updated_at FROM topics WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_from_tuple))
}

/// Rename a topic, enforcing unit ownership
pub async fn update_topic(
    pool: &SqlitePool,
    unit_id: &str,
    topic_id: &str,
    name: &str,
) -> Result<Option<TopicRow>, SqliteError> {
    let now = chrono::Utc::now().timestamp();

    let result =
        sqlx::query("UPDATE topics SET name = ?, updated_at = ? WHERE id = ? AND unit_id = ?")
            .bind(name)
            .bind(now)
            .bind(topic_id)
            .bind(unit_id)
            .execute(pool)
            .await
            .map_err(|e| SqliteError::or_conflict(e, DUPLICATE_TOPIC))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_topic(pool, topic_id).await
}

/// Delete a topic and its progress rows, enforcing unit ownership
pub async fn delete_topic(
    pool: &SqlitePool,
    unit_id: &str,
    topic_id: &str,
) -> Result<bool, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM progress WHERE topic_id = ?")
        .bind(topic_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM topics WHERE id = ? AND unit_id = ?")
        .bind(topic_id)
        .bind(unit_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        // Ownership check failed; keep the progress rows
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::setup_test_pool;
    use crate::data::sqlite::repositories::{progress, student, subject, unit};
    use crate::data::types::ProgressStatus;

    async fn make_unit(pool: &SqlitePool) -> (String, String) {
        let s = subject::create_subject(pool, "Biology").await.unwrap();
        let u = unit::add_unit(pool, &s.id, "Cells").await.unwrap().unwrap();
        (s.id, u.id)
    }

    #[tokio::test]
    async fn test_duplicate_name_in_unit_is_conflict() {
        let pool = setup_test_pool().await;
        let (_, unit_id) = make_unit(&pool).await;

        add_topic(&pool, &unit_id, "Mitosis").await.unwrap();
        let err = add_topic(&pool, &unit_id, "Mitosis").await.unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_same_name_allowed_in_different_units() {
        let pool = setup_test_pool().await;
        let (subject_id, unit_a) = make_unit(&pool).await;
        let unit_b = unit::add_unit(&pool, &subject_id, "Genetics")
            .await
            .unwrap()
            .unwrap()
            .id;

        add_topic(&pool, &unit_a, "Introduction").await.unwrap();
        add_topic(&pool, &unit_b, "Introduction").await.unwrap();
    }

    #[tokio::test]
    async fn test_topics_keep_insertion_order() {
        let pool = setup_test_pool().await;
        let (_, unit_id) = make_unit(&pool).await;

        let t1 = add_topic(&pool, &unit_id, "First").await.unwrap();
        let t2 = add_topic(&pool, &unit_id, "Second").await.unwrap();
        assert!(t1.position < t2.position);
    }

    #[tokio::test]
    async fn test_update_topic_wrong_unit_is_none() {
        let pool = setup_test_pool().await;
        let (subject_id, unit_a) = make_unit(&pool).await;
        let unit_b = unit::add_unit(&pool, &subject_id, "Genetics")
            .await
            .unwrap()
            .unwrap()
            .id;
        let t = add_topic(&pool, &unit_a, "Mitosis").await.unwrap();

        assert!(
            update_topic(&pool, &unit_b, &t.id, "Renamed")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(get_topic(&pool, &t.id).await.unwrap().unwrap().name, "Mitosis");
    }

    #[tokio::test]
    async fn test_rename_to_existing_name_is_conflict() {
        let pool = setup_test_pool().await;
        let (_, unit_id) = make_unit(&pool).await;
        add_topic(&pool, &unit_id, "Mitosis").await.unwrap();
        let t = add_topic(&pool, &unit_id, "Meiosis").await.unwrap();

        let err = update_topic(&pool, &unit_id, &t.id, "Mitosis")
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_topic_removes_progress() {
        let pool = setup_test_pool().await;
        let (_, unit_id) = make_unit(&pool).await;
        let t = add_topic(&pool, &unit_id, "Mitosis").await.unwrap();

        let s = student::create_student(&pool, "Aahil", None, &[]).await.unwrap();
        progress::upsert(&pool, &s.id, &t.id, ProgressStatus::Ok, None, None)
            .await
            .unwrap();

        assert!(delete_topic(&pool, &unit_id, &t.id).await.unwrap());
        assert!(get_topic(&pool, &t.id).await.unwrap().is_none());
        assert!(progress::list_for_student(&pool, &s.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_topic_wrong_unit_keeps_progress() {
        let pool = setup_test_pool().await;
        let (subject_id, unit_a) = make_unit(&pool).await;
        let unit_b = unit::add_unit(&pool, &subject_id, "Genetics")
            .await
            .unwrap()
            .unwrap()
            .id;
        let t = add_topic(&pool, &unit_a, "Mitosis").await.unwrap();

        let s = student::create_student(&pool, "Aahil", None, &[]).await.unwrap();
        progress::upsert(&pool, &s.id, &t.id, ProgressStatus::Ok, None, None)
            .await
            .unwrap();

        assert!(!delete_topic(&pool, &unit_b, &t.id).await.unwrap());
        assert_eq!(progress::list_for_student(&pool, &s.id).await.unwrap().len(), 1);
    }
}
