//! Progress repository for SQLite operations
//!
//! The single write path is an upsert keyed on (student_id, topic_id); the
//! UNIQUE index guarantees at most one row per pair even under concurrent
//! writers, with last-write-wins on the status.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{ProgressRow, ProgressStatus};

type ProgressTuple = (
    String,
    String,
    String,
    ProgressStatus,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

fn row_from_tuple(
    (id, student_id, topic_id, status, notes, updated_by, created_at, updated_at): ProgressTuple,
) -> ProgressRow {
    ProgressRow {
        id,
        student_id,
        topic_id,
        status,
        notes,
        updated_by,
        created_at,
        updated_at,
    }
}

const PROGRESS_COLUMNS: &str =
    "id, student_id, topic_id, status, notes, updated_by, created_at, updated_at";

/// Create or update the progress row for a (student, topic) pair
///
/// Existence of the student and topic is the caller's concern (they map a
/// miss to NotFound before calling); the foreign keys are the backstop.
pub async fn upsert(
    pool: &SqlitePool,
    student_id: &str,
    topic_id: &str,
    status: ProgressStatus,
    notes: Option<&str>,
    updated_by: Option<&str>,
) -> Result<ProgressRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    let row = sqlx::query_as::<_, ProgressTuple>(&format!(
        "INSERT INTO progress (id, student_id, topic_id, status, notes, updated_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(student_id, topic_id) DO UPDATE SET \
             status = excluded.status, \
             notes = excluded.notes, \
             updated_by = excluded.updated_by, \
             updated_at = excluded.updated_at \
         RETURNING {}",
        PROGRESS_COLUMNS
    ))
    .bind(&id)
    .bind(student_id)
    .bind(topic_id)
    .bind(status)
    .bind(notes)
    .bind(updated_by)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row_from_tuple(row))
}

/// All progress rows for a student
pub async fn list_for_student(
    pool: &SqlitePool,
    student_id: &str,
) -> Result<Vec<ProgressRow>, SqliteError> {
    let rows = sqlx::query_as::<_, ProgressTuple>(&format!(
        "SELECT {} FROM progress WHERE student_id = ? ORDER BY updated_at DESC, id ASC",
        PROGRESS_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_from_tuple).collect())
}

/// Progress rows for a student within one subject
///
/// Joins through the live subject > unit > topic tree, so rows whose topic
/// no longer belongs to the subject are excluded by construction.
pub async fn list_for_student_and_subject(
    pool: &SqlitePool,
    student_id: &str,
    subject_id: &str,
) -> Result<Vec<ProgressRow>, SqliteError> {
    let rows = sqlx::query_as::<_, ProgressTuple>(
        "SELECT p.id, p.student_id, p.topic_id, p.status, p.notes, p.updated_by, \
                p.created_at, p.updated_at \
         FROM progress p \
         JOIN topics t ON p.topic_id = t.id \
         JOIN units u ON t.unit_id = u.id \
         WHERE p.student_id = ? AND u.subject_id = ? \
         ORDER BY u.position ASC, t.position ASC",
    )
    .bind(student_id)
    .bind(subject_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_from_tuple).collect())
}

/// Most recently updated progress rows across all students
pub async fn list_recent(pool: &SqlitePool, limit: u32) -> Result<Vec<ProgressRow>, SqliteError> {
    let rows = sqlx::query_as::<_, ProgressTuple>(&format!(
        "SELECT {} FROM progress ORDER BY updated_at DESC, id ASC LIMIT ?",
        PROGRESS_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_from_tuple).collect())
}

/// Most recently updated progress rows across one parent's children
pub async fn list_recent_for_parent(
    pool: &SqlitePool,
    user_id: &str,
    limit: u32,
) -> Result<Vec<ProgressRow>, SqliteError> {
    let rows = sqlx::query_as::<_, ProgressTuple>(
        "SELECT p.id, p.student_id, p.topic_id, p.status, p.notes, p.updated_by, \
                p.created_at, p.updated_at \
         FROM progress p \
         JOIN student_parents sp ON sp.student_id = p.student_id \
         WHERE sp.user_id = ? \
         ORDER BY p.updated_at DESC, p.id ASC LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_from_tuple).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::setup_test_pool;
    use crate::data::sqlite::repositories::{student, subject, topic, unit, user};
    use crate::data::types::Role;

    struct Fixture {
        student_id: String,
        subject_id: String,
        topic_id: String,
    }

    async fn setup_fixture(pool: &SqlitePool) -> Fixture {
        let s = subject::create_subject(pool, "Biology").await.unwrap();
        let u = unit::add_unit(pool, &s.id, "Cells").await.unwrap().unwrap();
        let t = topic::add_topic(pool, &u.id, "Mitosis").await.unwrap();
        let st = student::create_student(pool, "Aahil", None, &[]).await.unwrap();
        Fixture {
            student_id: st.id,
            subject_id: s.id,
            topic_id: t.id,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_in_place() {
        let pool = setup_test_pool().await;
        let fx = setup_fixture(&pool).await;

        let first = upsert(
            &pool,
            &fx.student_id,
            &fx.topic_id,
            ProgressStatus::Started,
            Some("struggling"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(first.status, ProgressStatus::Started);

        let second = upsert(
            &pool,
            &fx.student_id,
            &fx.topic_id,
            ProgressStatus::Confident,
            None,
            None,
        )
        .await
        .unwrap();

        // Same row, updated fields, notes overwritten
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, ProgressStatus::Confident);
        assert!(second.notes.is_none());

        let rows = list_for_student(&pool, &fx.student_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, ProgressStatus::Confident);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = setup_test_pool().await;
        let fx = setup_fixture(&pool).await;

        for _ in 0..2 {
            upsert(
                &pool,
                &fx.student_id,
                &fx.topic_id,
                ProgressStatus::Confident,
                None,
                None,
            )
            .await
            .unwrap();
        }

        let rows = list_for_student(&pool, &fx.student_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, ProgressStatus::Confident);
    }

    #[tokio::test]
    async fn test_upsert_records_updated_by() {
        let pool = setup_test_pool().await;
        let fx = setup_fixture(&pool).await;
        let teacher = user::create_user(&pool, "Teacher", "t@x.com", "hash", Role::Admin)
            .await
            .unwrap();

        let row = upsert(
            &pool,
            &fx.student_id,
            &fx.topic_id,
            ProgressStatus::Ok,
            None,
            Some(&teacher.id),
        )
        .await
        .unwrap();
        assert_eq!(row.updated_by.as_deref(), Some(teacher.id.as_str()));
    }

    #[tokio::test]
    async fn test_subject_scoped_listing_joins_live_tree() {
        let pool = setup_test_pool().await;
        let fx = setup_fixture(&pool).await;

        // Second subject with its own topic and progress
        let other_subject = subject::create_subject(&pool, "Chemistry").await.unwrap();
        let other_unit = unit::add_unit(&pool, &other_subject.id, "Atoms")
            .await
            .unwrap()
            .unwrap();
        let other_topic = topic::add_topic(&pool, &other_unit.id, "Electrons")
            .await
            .unwrap();

        upsert(&pool, &fx.student_id, &fx.topic_id, ProgressStatus::Ok, None, None)
            .await
            .unwrap();
        upsert(
            &pool,
            &fx.student_id,
            &other_topic.id,
            ProgressStatus::Started,
            None,
            None,
        )
        .await
        .unwrap();

        let biology_rows =
            list_for_student_and_subject(&pool, &fx.student_id, &fx.subject_id)
                .await
                .unwrap();
        assert_eq!(biology_rows.len(), 1);
        assert_eq!(biology_rows[0].topic_id, fx.topic_id);
    }

    #[tokio::test]
    async fn test_recent_is_bounded_and_sorted() {
        let pool = setup_test_pool().await;
        let fx = setup_fixture(&pool).await;

        // A dozen topics, one progress row each
        let u = unit::add_unit(&pool, &fx.subject_id, "Extra").await.unwrap().unwrap();
        for i in 0..12 {
            let t = topic::add_topic(&pool, &u.id, &format!("Topic {}", i))
                .await
                .unwrap();
            upsert(&pool, &fx.student_id, &t.id, ProgressStatus::Started, None, None)
                .await
                .unwrap();
        }

        let recent = list_recent(&pool, 10).await.unwrap();
        assert_eq!(recent.len(), 10);
        for pair in recent.windows(2) {
            assert!(pair[0].updated_at >= pair[1].updated_at);
        }
    }

    #[tokio::test]
    async fn test_recent_for_parent_scopes_to_children() {
        let pool = setup_test_pool().await;
        let fx = setup_fixture(&pool).await;

        let parent = user::create_user(&pool, "Parent", "p@x.com", "hash", Role::Parent)
            .await
            .unwrap();
        let own_child = student::create_student(&pool, "Sara", None, &[parent.id.clone()])
            .await
            .unwrap();

        upsert(&pool, &fx.student_id, &fx.topic_id, ProgressStatus::Ok, None, None)
            .await
            .unwrap();
        upsert(&pool, &own_child.id, &fx.topic_id, ProgressStatus::Started, None, None)
            .await
            .unwrap();

        let recent = list_recent_for_parent(&pool, &parent.id, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].student_id, own_child.id);
    }

    #[tokio::test]
    async fn test_upsert_rejects_missing_student_or_topic() {
        let pool = setup_test_pool().await;
        let fx = setup_fixture(&pool).await;

        // Foreign keys are the backstop behind the handler's existence checks
        assert!(
            upsert(&pool, "missing", &fx.topic_id, ProgressStatus::Ok, None, None)
                .await
                .is_err()
        );
        assert!(
            upsert(&pool, &fx.student_id, "missing", ProgressStatus::Ok, None, None)
                .await
                .is_err()
        );
    }
}
