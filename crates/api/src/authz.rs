//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching a store, keeping domain crates
//! and infra auth-agnostic.

use aurora_auth::{AuthzError, Permission, Principal, Role, authorize};

use crate::context::PrincipalContext;

pub const PRODUCTS_WRITE: &str = "products.write";
pub const TRIAGE_RUN: &str = "triage.run";
pub const IMAGES_WRITE: &str = "images.write";
pub const IMAGES_READ: &str = "images.read";
pub const ANALYSES_READ: &str = "analyses.read";
pub const PROFILE_WRITE: &str = "profile.write";
pub const APPOINTMENTS_BOOK: &str = "appointments.book";
pub const APPOINTMENTS_MANAGE: &str = "appointments.manage";
pub const USERS_READ: &str = "users.read";

/// What a plain `user` may do: everything on their own data.
const USER_PERMISSIONS: &[&str] = &[
    TRIAGE_RUN,
    IMAGES_WRITE,
    IMAGES_READ,
    ANALYSES_READ,
    PROFILE_WRITE,
    APPOINTMENTS_BOOK,
];

/// Check that the request principal holds `required`.
pub fn require(principal: &PrincipalContext, required: &'static str) -> Result<(), AuthzError> {
    let principal = Principal {
        user_id: principal.user_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    authorize(&principal, &Permission::new(required))
}

/// Static role → permission policy.
///
/// `admin` grants the wildcard; `user` grants [`USER_PERMISSIONS`]; unknown
/// roles grant nothing.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(Role::is_admin) {
        return vec![Permission::WILDCARD];
    }

    if roles.iter().any(|r| *r == Role::USER) {
        return USER_PERMISSIONS.iter().map(|p| Permission::new(*p)).collect();
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_core::UserId;

    fn ctx(roles: Vec<Role>) -> PrincipalContext {
        PrincipalContext::new(UserId::new(), roles)
    }

    #[test]
    fn users_manage_their_own_data_only() {
        let user = ctx(vec![Role::USER]);
        assert!(require(&user, IMAGES_WRITE).is_ok());
        assert!(require(&user, APPOINTMENTS_BOOK).is_ok());
        assert!(require(&user, PRODUCTS_WRITE).is_err());
        assert!(require(&user, APPOINTMENTS_MANAGE).is_err());
    }

    #[test]
    fn admin_holds_everything() {
        let admin = ctx(vec![Role::ADMIN]);
        for perm in [PRODUCTS_WRITE, USERS_READ, APPOINTMENTS_MANAGE, IMAGES_WRITE] {
            assert!(require(&admin, perm).is_ok(), "{perm}");
        }
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        let viewer = ctx(vec![Role::new("viewer")]);
        assert!(require(&viewer, TRIAGE_RUN).is_err());
    }
}
