//! Student repository for SQLite operations
//!
//! Parent links live in `student_parents`, the single relation behind both
//! "a student's parents" and "a parent's children". Reassignment replaces
//! the link rows in one transaction so the two views cannot diverge.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::StudentRow;

type StudentTuple = (String, String, Option<String>, i64, i64);

fn row_from_tuple((id, name, grade, created_at, updated_at): StudentTuple) -> StudentRow {
    StudentRow {
        id,
        name,
        grade,
        created_at,
        updated_at,
    }
}

/// Create a student and link it to its parents in one transaction
pub async fn create_student(
    pool: &SqlitePool,
    name: &str,
    grade: Option<&str>,
    parent_ids: &[String],
) -> Result<StudentRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO students (id, name, grade, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(grade)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for parent_id in parent_ids {
        sqlx::query(
            "INSERT INTO student_parents (student_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&id)
        .bind(parent_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(StudentRow {
        id,
        name: name.to_string(),
        grade: grade.map(String::from),
        created_at: now,
        updated_at: now,
    })
}

/// Get a student by ID
pub async fn get_student(pool: &SqlitePool, id: &str) -> Result<Option<StudentRow>, SqliteError> {
    let row = sqlx::query_as::<_, StudentTuple>(
        "SELECT id, name, grade, created_at, updated_at FROM students WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_from_tuple))
}

/// Parent user ids for a student
pub async fn parent_ids(pool: &SqlitePool, student_id: &str) -> Result<Vec<String>, SqliteError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT user_id FROM student_parents WHERE student_id = ? ORDER BY created_at ASC, user_id ASC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// List all students, oldest first
pub async fn list_students(pool: &SqlitePool) -> Result<Vec<StudentRow>, SqliteError> {
    let rows = sqlx::query_as::<_, StudentTuple>(
        "SELECT id, name, grade, created_at, updated_at FROM students ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_from_tuple).collect())
}

/// List the students linked to a parent user
pub async fn list_students_for_parent(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<StudentRow>, SqliteError> {
    let rows = sqlx::query_as::<_, StudentTuple>(
        "SELECT s.id, s.name, s.grade, s.created_at, s.updated_at \
         FROM students s \
         JOIN student_parents sp ON sp.student_id = s.id \
         WHERE sp.user_id = ? \
         ORDER BY s.created_at ASC, s.id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_from_tuple).collect())
}

/// Update a student's name and/or grade; unset fields keep their value
pub async fn update_student(
    pool: &SqlitePool,
    id: &str,
    name: Option<&str>,
    grade: Option<&str>,
) -> Result<Option<StudentRow>, SqliteError> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        "UPDATE students SET name = COALESCE(?, name), grade = COALESCE(?, grade), \
         updated_at = ? WHERE id = ?",
    )
    .bind(name)
    .bind(grade)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_student(pool, id).await
}

/// Replace a student's parent links with a new set
///
/// Both the removal from the old parents and the addition to the new ones
/// happen in one transaction. Returns false if the student does not exist.
pub async fn reassign_parents(
    pool: &SqlitePool,
    student_id: &str,
    parent_ids: &[String],
) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp();

    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Ok(false);
    }

    sqlx::query("DELETE FROM student_parents WHERE student_id = ?")
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    for parent_id in parent_ids {
        sqlx::query(
            "INSERT INTO student_parents (student_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(student_id)
        .bind(parent_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE students SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Delete a student; progress rows and parent links go with it (FK cascade)
pub async fn delete_student(pool: &SqlitePool, id: &str) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::setup_test_pool;
    use crate::data::sqlite::repositories::user;
    use crate::data::types::Role;

    async fn make_parent(pool: &SqlitePool, email: &str) -> String {
        user::create_user(pool, "Parent", email, "hash", Role::Parent)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_student_with_parent_links() {
        let pool = setup_test_pool().await;
        let parent = make_parent(&pool, "p@x.com").await;

        let student = create_student(&pool, "Aahil", Some("10"), &[parent.clone()])
            .await
            .unwrap();

        assert_eq!(parent_ids(&pool, &student.id).await.unwrap(), vec![parent.clone()]);
        assert_eq!(user::children_ids(&pool, &parent).await.unwrap(), vec![student.id]);
    }

    #[tokio::test]
    async fn test_parent_sees_only_own_children() {
        let pool = setup_test_pool().await;
        let p1 = make_parent(&pool, "p1@x.com").await;
        let p2 = make_parent(&pool, "p2@x.com").await;

        let s1 = create_student(&pool, "Aahil", None, &[p1.clone()]).await.unwrap();
        let s2 = create_student(&pool, "Sara", None, &[p1.clone()]).await.unwrap();
        create_student(&pool, "John", None, &[p2.clone()]).await.unwrap();

        let visible: Vec<String> = list_students_for_parent(&pool, &p1)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(visible, vec![s1.id, s2.id]);

        assert_eq!(list_students(&pool).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reassign_parents_updates_both_sides() {
        let pool = setup_test_pool().await;
        let old_parent = make_parent(&pool, "old@x.com").await;
        let new_parent = make_parent(&pool, "new@x.com").await;

        let student = create_student(&pool, "Sara", None, &[old_parent.clone()])
            .await
            .unwrap();

        assert!(
            reassign_parents(&pool, &student.id, &[new_parent.clone()])
                .await
                .unwrap()
        );

        assert_eq!(parent_ids(&pool, &student.id).await.unwrap(), vec![new_parent.clone()]);
        assert!(user::children_ids(&pool, &old_parent).await.unwrap().is_empty());
        assert_eq!(
            user::children_ids(&pool, &new_parent).await.unwrap(),
            vec![student.id]
        );
    }

    #[tokio::test]
    async fn test_reassign_parents_missing_student() {
        let pool = setup_test_pool().await;
        assert!(!reassign_parents(&pool, "missing", &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_student_partial() {
        let pool = setup_test_pool().await;
        let student = create_student(&pool, "Old", Some("9"), &[]).await.unwrap();

        let updated = update_student(&pool, &student.id, Some("New"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.grade.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_delete_student_removes_links() {
        let pool = setup_test_pool().await;
        let parent = make_parent(&pool, "p@x.com").await;
        let student = create_student(&pool, "Aahil", None, &[parent.clone()])
            .await
            .unwrap();

        assert!(delete_student(&pool, &student.id).await.unwrap());
        assert!(get_student(&pool, &student.id).await.unwrap().is_none());
        assert!(user::children_ids(&pool, &parent).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_parent_user_unlinks_students() {
        let pool = setup_test_pool().await;
        let parent = make_parent(&pool, "p@x.com").await;
        let student = create_student(&pool, "Aahil", None, &[parent.clone()])
            .await
            .unwrap();

        user::delete_user(&pool, &parent).await.unwrap();

        // Student survives, the link does not
        assert!(get_student(&pool, &student.id).await.unwrap().is_some());
        assert!(parent_ids(&pool, &student.id).await.unwrap().is_empty());
    }
}
