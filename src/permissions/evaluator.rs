//! Effective-permission resolution.
//!
//! Merges three layers into one set:
//! 1. hierarchy defaults implied by the role's level,
//! 2. explicit role grants,
//! 3. per-user overrides, applied last - a user-level grant adds a pair the
//!    role never had, a user-level revoke removes a pair no matter which
//!    layer contributed it.
//!
//! Pure set arithmetic over static inputs; the database rows are loaded by
//! the request-context middleware before this runs.

use std::collections::HashSet;

use super::registry::{hierarchy_defaults, Permission, Resource};

/// One `user_permissions` row: grant (true) or revoke (false) of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionOverride {
    pub resource: Resource,
    pub permission: Permission,
    pub granted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EffectivePermissions {
    allowed: HashSet<(Resource, Permission)>,
}

impl EffectivePermissions {
    pub fn can(&self, resource: Resource, permission: Permission) -> bool {
        self.allowed.contains(&(resource, permission))
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Sorted `resource:permission` strings for the client-side gate
    pub fn as_strings(&self) -> Vec<String> {
        let mut list: Vec<String> = self
            .allowed
            .iter()
            .map(|(resource, permission)| format!("{}:{}", resource, permission))
            .collect();
        list.sort();
        list
    }
}

/// Compute the effective permission set for one user.
///
/// `role_level` is the hierarchy level of the user's role, or `None` when the
/// user has no role - which resolves to default-deny before overrides.
pub fn resolve(
    role_level: Option<i32>,
    role_grants: &[(Resource, Permission)],
    user_overrides: &[PermissionOverride],
) -> EffectivePermissions {
    let mut allowed = hierarchy_defaults(role_level.unwrap_or(0));

    for (resource, permission) in role_grants {
        allowed.insert((*resource, *permission));
    }

    // User-level entries win over everything above
    for entry in user_overrides {
        if entry.granted {
            allowed.insert((entry.resource, entry.permission));
        } else {
            allowed.remove(&(entry.resource, entry.permission));
        }
    }

    EffectivePermissions { allowed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(resource: Resource, permission: Permission) -> PermissionOverride {
        PermissionOverride { resource, permission, granted: true }
    }

    fn revoke(resource: Resource, permission: Permission) -> PermissionOverride {
        PermissionOverride { resource, permission, granted: false }
    }

    #[test]
    fn no_role_is_default_deny() {
        let perms = resolve(None, &[], &[]);
        assert!(perms.is_empty());
        assert!(!perms.can(Resource::Leads, Permission::View));
    }

    #[test]
    fn role_grants_union_with_hierarchy_defaults() {
        let perms = resolve(
            Some(3),
            &[(Resource::Proposals, Permission::View)],
            &[],
        );
        // From level-3 defaults
        assert!(perms.can(Resource::Leads, Permission::Create));
        // From the explicit role grant
        assert!(perms.can(Resource::Proposals, Permission::View));
        // Nobody granted this
        assert!(!perms.can(Resource::Proposals, Permission::Delete));
    }

    #[test]
    fn user_revoke_beats_role_grant_and_defaults() {
        let perms = resolve(
            Some(2),
            &[(Resource::Leads, Permission::View)],
            &[revoke(Resource::Leads, Permission::View)],
        );
        assert!(!perms.can(Resource::Leads, Permission::View));
        // Unrelated defaults survive
        assert!(perms.can(Resource::Projects, Permission::View));
    }

    #[test]
    fn user_grant_beats_role_absence() {
        let perms = resolve(Some(3), &[], &[grant(Resource::CashVouchers, Permission::Delete)]);
        assert!(perms.can(Resource::CashVouchers, Permission::Delete));
    }

    #[test]
    fn user_grant_allows_even_without_role() {
        let perms = resolve(None, &[], &[grant(Resource::Tickets, Permission::View)]);
        assert!(perms.can(Resource::Tickets, Permission::View));
        assert!(!perms.can(Resource::Tickets, Permission::Create));
    }

    #[test]
    fn admin_defaults_survive_unrelated_overrides() {
        let perms = resolve(Some(1), &[], &[revoke(Resource::Users, Permission::Delete)]);
        assert!(!perms.can(Resource::Users, Permission::Delete));
        assert!(perms.can(Resource::Users, Permission::Edit));
        assert!(perms.can(Resource::AuditLogs, Permission::View));
    }

    #[test]
    fn as_strings_is_sorted_wire_format() {
        let perms = resolve(
            None,
            &[],
            &[
                grant(Resource::Tickets, Permission::View),
                grant(Resource::Leads, Permission::View),
            ],
        );
        assert_eq!(perms.as_strings(), vec!["leads:view", "tickets:view"]);
    }
}
