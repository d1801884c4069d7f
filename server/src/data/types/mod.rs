//! Row types shared by the data layer and API handlers

pub mod enums;

pub use enums::{ProgressStatus, Role};

use serde::Serialize;

/// User row (`password_hash` stays inside the data layer; DTOs never carry it)
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub grade: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectRow {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitRow {
    pub id: String,
    pub subject_id: String,
    pub name: String,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicRow {
    pub id: String,
    pub unit_id: String,
    pub name: String,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressRow {
    pub id: String,
    pub student_id: String,
    pub topic_id: String,
    pub status: ProgressStatus,
    pub notes: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A unit with its topics in insertion order
#[derive(Debug, Clone)]
pub struct UnitTree {
    pub unit: UnitRow,
    pub topics: Vec<TopicRow>,
}

/// A subject with its units and their topics in insertion order
#[derive(Debug, Clone)]
pub struct SubjectTree {
    pub subject: SubjectRow,
    pub units: Vec<UnitTree>,
}
