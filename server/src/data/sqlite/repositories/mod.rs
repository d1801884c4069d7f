//! Repository modules for SQLite operations
//!
//! Each module owns the queries for one table (plus its immediate
//! relations). Cascading deletes run inside transactions so a failed
//! cascade leaves the tree untouched.

pub mod progress;
pub mod student;
pub mod subject;
pub mod topic;
pub mod unit;
pub mod user;
