//! Closed enumerations shared between storage, domain rules and the API

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller role
///
/// A closed set instead of free-form role strings: authorization predicates
/// match exhaustively on this type, so adding a role forces every rule to be
/// revisited.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    /// Parent account; the stored and wire value is `user`
    #[serde(rename = "user")]
    #[sqlx(rename = "user")]
    Parent,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Parent => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::Parent),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Mastery level of one student on one topic
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStudied,
    Started,
    Difficult,
    Ok,
    Confident,
}

impl ProgressStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStudied => "not_studied",
            ProgressStatus::Started => "started",
            ProgressStatus::Difficult => "difficult",
            ProgressStatus::Ok => "ok",
            ProgressStatus::Confident => "confident",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_studied" => Ok(ProgressStatus::NotStudied),
            "started" => Ok(ProgressStatus::Started),
            "difficult" => Ok(ProgressStatus::Difficult),
            "ok" => Ok(ProgressStatus::Ok),
            "confident" => Ok(ProgressStatus::Confident),
            other => Err(format!("Unknown progress status: {}", other)),
        }
    }
}
