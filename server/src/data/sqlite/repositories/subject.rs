//! Subject repository for SQLite operations
//!
//! Deleting a subject cascades through its units and topics, including the
//! progress rows recorded against those topics. The whole cascade is one
//! transaction: it either completes or leaves the tree untouched.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{SubjectRow, SubjectTree, TopicRow, UnitRow, UnitTree};

type SubjectTuple = (String, String, i64, i64);

fn row_from_tuple((id, name, created_at, updated_at): SubjectTuple) -> SubjectRow {
    SubjectRow {
        id,
        name,
        created_at,
        updated_at,
    }
}

/// Create a subject with a generated CUID2 ID
pub async fn create_subject(pool: &SqlitePool, name: &str) -> Result<SubjectRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    sqlx::query("INSERT INTO subjects (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(SubjectRow {
        id,
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Get a subject by ID
pub async fn get_subject(pool: &SqlitePool, id: &str) -> Result<Option<SubjectRow>, SqliteError> {
    let row = sqlx::query_as::<_, SubjectTuple>(
        "SELECT id, name, created_at, updated_at FROM subjects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_from_tuple))
}

/// Get a subject with its units and topics nested in insertion order
pub async fn get_subject_tree(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<SubjectTree>, SqliteError> {
    let Some(subject) = get_subject(pool, id).await? else {
        return Ok(None);
    };

    let units = sqlx::query_as::<_, (String, String, String, i64, i64, i64)>(
        "SELECT id, subject_id, name, position, created_at, updated_at \
         FROM units WHERE subject_id = ? ORDER BY position ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut tree_units = Vec::with_capacity(units.len());
    for (unit_id, subject_id, name, position, created_at, updated_at) in units {
        let topics = sqlx::query_as::<_, (String, String, String, i64, i64, i64)>(
            "SELECT id, unit_id, name, position, created_at, updated_at \
             FROM topics WHERE unit_id = ? ORDER BY position ASC",
        )
        .bind(&unit_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(
            |(id, unit_id, name, position, created_at, updated_at)| TopicRow {
                id,
                unit_id,
                name,
                position,
                created_at,
                updated_at,
            },
        )
        .collect();

        tree_units.push(UnitTree {
            unit: UnitRow {
                id: unit_id,
                subject_id,
                name,
                position,
                created_at,
                updated_at,
            },
            topics,
        });
    }

    Ok(Some(SubjectTree {
        subject,
        units: tree_units,
    }))
}

/// List all subjects with nested units and topics
pub async fn list_subject_trees(pool: &SqlitePool) -> Result<Vec<SubjectTree>, SqliteError> {
    let ids: Vec<(String,)> =
        sqlx::query_as("SELECT id FROM subjects ORDER BY created_at ASC, id ASC")
            .fetch_all(pool)
            .await?;

    // One tree query per subject; fine for curriculum-sized data
    let mut trees = Vec::with_capacity(ids.len());
    for (id,) in ids {
        if let Some(tree) = get_subject_tree(pool, &id).await? {
            trees.push(tree);
        }
    }

    Ok(trees)
}

/// Rename a subject
pub async fn update_subject(
    pool: &SqlitePool,
    id: &str,
    name: &str,
) -> Result<Option<SubjectRow>, SqliteError> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query("UPDATE subjects SET name = ?, updated_at = ? WHERE id = ?")
        .bind(name)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_subject(pool, id).await
}

/// Delete a subject and everything under it
///
/// Order matters: progress rows referencing the subject's topics first,
/// then topics, then units, then the subject itself.
pub async fn delete_subject(pool: &SqlitePool, id: &str) -> Result<bool, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM progress WHERE topic_id IN \
         (SELECT t.id FROM topics t JOIN units u ON t.unit_id = u.id WHERE u.subject_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM topics WHERE unit_id IN (SELECT id FROM units WHERE subject_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM units WHERE subject_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::setup_test_pool;
    use crate::data::sqlite::repositories::{progress, student, topic, unit};
    use crate::data::types::ProgressStatus;

    #[tokio::test]
    async fn test_create_and_get_subject() {
        let pool = setup_test_pool().await;
        let subject = create_subject(&pool, "Biology").await.unwrap();

        let fetched = get_subject(&pool, &subject.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Biology");
    }

    #[tokio::test]
    async fn test_subject_names_need_not_be_unique() {
        let pool = setup_test_pool().await;
        create_subject(&pool, "Biology").await.unwrap();
        create_subject(&pool, "Biology").await.unwrap();

        assert_eq!(list_subject_trees(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_tree_round_trip() {
        let pool = setup_test_pool().await;
        let subject = create_subject(&pool, "Biology").await.unwrap();
        let u = unit::add_unit(&pool, &subject.id, "Cell biology")
            .await
            .unwrap()
            .unwrap();
        topic::add_topic(&pool, &u.id, "Cell structure").await.unwrap();

        let tree = get_subject_tree(&pool, &subject.id).await.unwrap().unwrap();
        assert_eq!(tree.subject.name, "Biology");
        assert_eq!(tree.units.len(), 1);
        assert_eq!(tree.units[0].unit.name, "Cell biology");
        assert_eq!(tree.units[0].topics.len(), 1);
        assert_eq!(tree.units[0].topics[0].name, "Cell structure");
    }

    #[tokio::test]
    async fn test_update_subject() {
        let pool = setup_test_pool().await;
        let subject = create_subject(&pool, "Biology").await.unwrap();

        let updated = update_subject(&pool, &subject.id, "Advanced Biology")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Advanced Biology");

        assert!(update_subject(&pool, "missing", "X").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_subject_cascades_to_units_topics_and_progress() {
        let pool = setup_test_pool().await;
        let subject = create_subject(&pool, "Biology").await.unwrap();
        let u = unit::add_unit(&pool, &subject.id, "Cells")
            .await
            .unwrap()
            .unwrap();
        let t = topic::add_topic(&pool, &u.id, "Mitosis").await.unwrap();

        let s = student::create_student(&pool, "Aahil", None, &[]).await.unwrap();
        progress::upsert(&pool, &s.id, &t.id, ProgressStatus::Started, None, None)
            .await
            .unwrap();

        assert!(delete_subject(&pool, &subject.id).await.unwrap());

        assert!(get_subject(&pool, &subject.id).await.unwrap().is_none());
        assert!(unit::get_unit(&pool, &u.id).await.unwrap().is_none());
        assert!(topic::get_topic(&pool, &t.id).await.unwrap().is_none());
        assert!(progress::list_for_student(&pool, &s.id).await.unwrap().is_empty());

        // The subject is gone: adding a unit to it fails the existence check
        assert!(unit::add_unit(&pool, &subject.id, "New unit").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_subject_returns_false() {
        let pool = setup_test_pool().await;
        assert!(!delete_subject(&pool, "missing").await.unwrap());
    }
}
