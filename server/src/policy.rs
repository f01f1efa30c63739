//! Capability-based authorization: each role maps to a set of
//! `{resource, action, scope}` triples, checked once at the top of a
//! handler instead of ad hoc conditionals inside it. Scopes widen in
//! order own < department < global.

use depot::models::{Category, Role};
use uuid::Uuid;

use crate::{error::AppError, session::Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Complaint,
    User,
    Department,
    SupportMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Allocate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Own,
    Department,
    Global,
}

/// The widest scope at which a role may perform an action, or `None` when
/// the action is not granted at all.
pub fn scope_for(role: Role, resource: Resource, action: Action) -> Option<Scope> {
    use Action::*;
    use Resource::*;

    match role {
        Role::Admin => Some(Scope::Global),
        Role::Staff => match (resource, action) {
            (Complaint, Read) | (Complaint, Update) => Some(Scope::Department),
            (SupportMessage, Create) => Some(Scope::Own),
            (User, Update) => Some(Scope::Own),
            _ => None,
        },
        Role::Citizen => match (resource, action) {
            (Complaint, Create) | (Complaint, Read) | (Complaint, Delete) => Some(Scope::Own),
            (SupportMessage, Create) => Some(Scope::Own),
            (User, Update) => Some(Scope::Own),
            _ => None,
        },
    }
}

pub fn require(
    identity: &Identity,
    resource: Resource,
    action: Action,
) -> Result<Scope, AppError> {
    scope_for(identity.role, resource, action)
        .ok_or(AppError::Forbidden("you are not allowed to perform this action"))
}

/// Require a capability that is not scoped down to a department or owner,
/// i.e. the administrative form of the action.
pub fn require_global(
    identity: &Identity,
    resource: Resource,
    action: Action,
) -> Result<(), AppError> {
    match require(identity, resource, action)? {
        Scope::Global => Ok(()),
        _ => Err(AppError::Forbidden("admin access required")),
    }
}

/// Department scoping: staff act only on complaints whose category equals
/// their department.
pub fn check_department(
    identity: &Identity,
    scope: Scope,
    category: Category,
) -> Result<(), AppError> {
    match scope {
        Scope::Global => Ok(()),
        Scope::Department if identity.department == Some(category) => Ok(()),
        Scope::Department => Err(AppError::Forbidden(
            "you can only update complaints from your department",
        )),
        Scope::Own => Err(AppError::Forbidden("staff access required")),
    }
}

pub fn check_owner(identity: &Identity, scope: Scope, owner: Uuid) -> Result<(), AppError> {
    match scope {
        Scope::Global => Ok(()),
        Scope::Own if identity.id == owner => Ok(()),
        _ => Err(AppError::Forbidden("you do not own this resource")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role, department: Option<Category>) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            role,
            email: "t@example.com".to_string(),
            fullname: "T".to_string(),
            ward: None,
            department,
        }
    }

    #[test]
    fn staff_update_is_department_scoped() {
        let staff = identity(Role::Staff, Some(Category::Roads));
        let scope = require(&staff, Resource::Complaint, Action::Update).unwrap();

        assert_eq!(scope, Scope::Department);
        assert!(check_department(&staff, scope, Category::Roads).is_ok());
        assert!(check_department(&staff, scope, Category::Water).is_err());
    }

    #[test]
    fn staff_cannot_delete_or_allocate() {
        let staff = identity(Role::Staff, Some(Category::Water));

        assert!(require(&staff, Resource::Complaint, Action::Delete).is_err());
        assert!(require(&staff, Resource::Complaint, Action::Allocate).is_err());
        assert!(require_global(&staff, Resource::User, Action::Update).is_err());
    }

    #[test]
    fn citizens_act_on_their_own_complaints_only() {
        let citizen = identity(Role::Citizen, None);
        let scope = require(&citizen, Resource::Complaint, Action::Delete).unwrap();

        assert!(check_owner(&citizen, scope, citizen.id).is_ok());
        assert!(check_owner(&citizen, scope, Uuid::new_v4()).is_err());
        assert!(require(&citizen, Resource::User, Action::Delete).is_err());
    }

    #[test]
    fn admin_is_unscoped() {
        let admin = identity(Role::Admin, None);
        let scope = require(&admin, Resource::Complaint, Action::Update).unwrap();

        assert_eq!(scope, Scope::Global);
        assert!(check_department(&admin, scope, Category::Power).is_ok());
        assert!(check_owner(&admin, scope, Uuid::new_v4()).is_ok());
        assert!(require_global(&admin, Resource::User, Action::Delete).is_ok());
    }
}
