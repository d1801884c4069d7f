//! Authorization predicates
//!
//! Pure functions over the caller identity and resource facts, matched
//! exhaustively on `Role`. Every mutating route calls one of these before
//! touching the store; a failed predicate maps to 403 Forbidden at the API
//! boundary, never 404.

use crate::data::types::Role;

/// Authenticated caller identity, passed explicitly into every operation
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Staff (teachers and the super admin) manage students
pub fn can_manage_students(role: Role) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Admin => true,
        Role::Parent => false,
    }
}

/// Staff manage the curriculum tree; everyone may read it
pub fn can_manage_curriculum(role: Role) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Admin => true,
        Role::Parent => false,
    }
}

/// Staff record progress; parents are read-only
pub fn can_record_progress(role: Role) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Admin => true,
        Role::Parent => false,
    }
}

/// Staff see every student; parents see only their own children
pub fn can_view_student(caller: &Caller, parent_ids: &[String]) -> bool {
    match caller.role {
        Role::SuperAdmin => true,
        Role::Admin => true,
        Role::Parent => parent_ids.iter().any(|p| *p == caller.id),
    }
}

/// Only the super admin lists all users
pub fn can_list_users(role: Role) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Admin => false,
        Role::Parent => false,
    }
}

/// A user record is visible to its owner and to the super admin
pub fn can_view_user(caller: &Caller, target_user_id: &str) -> bool {
    match caller.role {
        Role::SuperAdmin => true,
        Role::Admin => caller.id == target_user_id,
        Role::Parent => caller.id == target_user_id,
    }
}

/// Only the super admin creates, updates or deletes user accounts
/// (role changes included)
pub fn can_manage_users(role: Role) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Admin => false,
        Role::Parent => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: &str, role: Role) -> Caller {
        Caller {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            role,
        }
    }

    #[test]
    fn test_staff_predicates() {
        for check in [can_manage_students, can_manage_curriculum, can_record_progress] {
            assert!(check(Role::SuperAdmin));
            assert!(check(Role::Admin));
            assert!(!check(Role::Parent));
        }
    }

    #[test]
    fn test_student_visibility_for_staff() {
        let no_parents: Vec<String> = vec![];
        assert!(can_view_student(&caller("u1", Role::SuperAdmin), &no_parents));
        assert!(can_view_student(&caller("u1", Role::Admin), &no_parents));
    }

    #[test]
    fn test_student_visibility_for_parents() {
        let parents = vec!["p1".to_string(), "p2".to_string()];
        assert!(can_view_student(&caller("p1", Role::Parent), &parents));
        assert!(can_view_student(&caller("p2", Role::Parent), &parents));
        assert!(!can_view_student(&caller("p3", Role::Parent), &parents));
        assert!(!can_view_student(&caller("p1", Role::Parent), &[]));
    }

    #[test]
    fn test_user_listing_is_super_admin_only() {
        assert!(can_list_users(Role::SuperAdmin));
        assert!(!can_list_users(Role::Admin));
        assert!(!can_list_users(Role::Parent));
    }

    #[test]
    fn test_user_visibility_is_self_or_super_admin() {
        assert!(can_view_user(&caller("u1", Role::SuperAdmin), "u2"));
        assert!(can_view_user(&caller("u1", Role::Admin), "u1"));
        assert!(!can_view_user(&caller("u1", Role::Admin), "u2"));
        assert!(can_view_user(&caller("u1", Role::Parent), "u1"));
        assert!(!can_view_user(&caller("u1", Role::Parent), "u2"));
    }

    #[test]
    fn test_user_management_is_super_admin_only() {
        assert!(can_manage_users(Role::SuperAdmin));
        assert!(!can_manage_users(Role::Admin));
        assert!(!can_manage_users(Role::Parent));
    }
}
