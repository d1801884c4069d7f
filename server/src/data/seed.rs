//! Demo data for local development
//!
//! Mirrors the fixture set used by the frontend during development: a super
//! admin, a teacher, two parent accounts with linked students, and a small
//! three-subject curriculum. Refuses to touch a non-empty database.

use sqlx::SqlitePool;

use super::sqlite::SqliteError;
use super::sqlite::repositories::{progress, student, subject, topic, unit, user};
use super::types::{ProgressStatus, Role};
use crate::utils::password::hash_password;

/// Demo account password, printed after seeding
pub const DEMO_PASSWORD: &str = "password";

/// Populate an empty database with demo users, students and a curriculum
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<(), SqliteError> {
    if user::count_users(pool).await? > 0 {
        return Err(SqliteError::Conflict(
            "Database is not empty; refusing to seed".to_string(),
        ));
    }

    let password_hash = hash_password(DEMO_PASSWORD)
        .map_err(|e| SqliteError::Conflict(format!("Failed to hash demo password: {}", e)))?;

    user::create_user(
        pool,
        "Super Admin",
        "superadmin@example.com",
        &password_hash,
        Role::SuperAdmin,
    )
    .await?;
    let teacher = user::create_user(
        pool,
        "Teacher",
        "teacher@example.com",
        &password_hash,
        Role::Admin,
    )
    .await?;
    let parent1 = user::create_user(
        pool,
        "Parent 1",
        "parent@example.com",
        &password_hash,
        Role::Parent,
    )
    .await?;
    let parent2 = user::create_user(
        pool,
        "Parent 2",
        "parent2@example.com",
        &password_hash,
        Role::Parent,
    )
    .await?;

    let aahil =
        student::create_student(pool, "Aahil", Some("10"), &[parent1.id.clone()]).await?;
    student::create_student(pool, "Sara", Some("9"), &[parent1.id.clone()]).await?;
    student::create_student(pool, "John", Some("11"), &[parent2.id.clone()]).await?;

    let mut first_topic_id = None;
    for (subject_name, units) in [
        (
            "Biology",
            vec![
                ("Cell biology", vec!["Cell structure", "Mitosis"]),
                ("Genetics", vec!["Inheritance", "DNA"]),
            ],
        ),
        (
            "Chemistry",
            vec![("Atomic structure", vec!["Atoms", "Electron shells"])],
        ),
        (
            "Physics",
            vec![("Forces", vec!["Newton's laws", "Friction"])],
        ),
    ] {
        let s = subject::create_subject(pool, subject_name).await?;
        for (unit_name, topics) in units {
            let u = unit::add_unit(pool, &s.id, unit_name)
                .await?
                .expect("subject was just created");
            for topic_name in topics {
                let t = topic::add_topic(pool, &u.id, topic_name).await?;
                first_topic_id.get_or_insert(t.id);
            }
        }
    }

    // One progress row so the recent feed is not empty
    if let Some(topic_id) = first_topic_id {
        progress::upsert(
            pool,
            &aahil.id,
            &topic_id,
            ProgressStatus::Started,
            None,
            Some(&teacher.id),
        )
        .await?;
    }

    tracing::info!("Demo data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::setup_test_pool;

    #[tokio::test]
    async fn test_seed_populates_empty_database() {
        let pool = setup_test_pool().await;
        seed_demo_data(&pool).await.unwrap();

        assert_eq!(user::count_users(&pool).await.unwrap(), 4);
        assert_eq!(student::list_students(&pool).await.unwrap().len(), 3);
        assert_eq!(subject::list_subject_trees(&pool).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_seed_refuses_non_empty_database() {
        let pool = setup_test_pool().await;
        user::create_user(&pool, "Existing", "e@x.com", "hash", Role::Parent)
            .await
            .unwrap();

        let err = seed_demo_data(&pool).await.unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_seeded_parent_sees_two_children() {
        let pool = setup_test_pool().await;
        seed_demo_data(&pool).await.unwrap();

        let parent = user::get_by_email(&pool, "parent@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user::children_ids(&pool, &parent.id).await.unwrap().len(), 2);
    }
}
