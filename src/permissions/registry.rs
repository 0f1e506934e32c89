//! Static registry of guardable resources and permission verbs.
//!
//! Every feature slice is gated on a (resource, permission) pair. Both enums
//! round-trip to the snake_case strings stored in `role_permissions` /
//! `user_permissions` rows and served to clients for UI gating.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Leads,
    Proposals,
    Projects,
    PurchaseOrders,
    CashVouchers,
    Tickets,
    Holidays,
    Attendance,
    Users,
    Roles,
    AuditLogs,
}

impl Resource {
    pub const ALL: [Resource; 11] = [
        Resource::Leads,
        Resource::Proposals,
        Resource::Projects,
        Resource::PurchaseOrders,
        Resource::CashVouchers,
        Resource::Tickets,
        Resource::Holidays,
        Resource::Attendance,
        Resource::Users,
        Resource::Roles,
        Resource::AuditLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Leads => "leads",
            Resource::Proposals => "proposals",
            Resource::Projects => "projects",
            Resource::PurchaseOrders => "purchase_orders",
            Resource::CashVouchers => "cash_vouchers",
            Resource::Tickets => "tickets",
            Resource::Holidays => "holidays",
            Resource::Attendance => "attendance",
            Resource::Users => "users",
            Resource::Roles => "roles",
            Resource::AuditLogs => "audit_logs",
        }
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leads" => Ok(Resource::Leads),
            "proposals" => Ok(Resource::Proposals),
            "projects" => Ok(Resource::Projects),
            "purchase_orders" => Ok(Resource::PurchaseOrders),
            "cash_vouchers" => Ok(Resource::CashVouchers),
            "tickets" => Ok(Resource::Tickets),
            "holidays" => Ok(Resource::Holidays),
            "attendance" => Ok(Resource::Attendance),
            "users" => Ok(Resource::Users),
            "roles" => Ok(Resource::Roles),
            "audit_logs" => Ok(Resource::AuditLogs),
            other => Err(format!("unknown resource: {}", other)),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    View,
    Create,
    Edit,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::View,
        Permission::Create,
        Permission::Edit,
        Permission::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Create => "create",
            Permission::Edit => "edit",
            Permission::Delete => "delete",
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Permission::View),
            "create" => Ok(Permission::Create),
            "edit" => Ok(Permission::Edit),
            "delete" => Ok(Permission::Delete),
            other => Err(format!("unknown permission: {}", other)),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business-document resources that managers may create and edit by default
const MANAGER_EDITABLE: [Resource; 8] = [
    Resource::Leads,
    Resource::Proposals,
    Resource::Projects,
    Resource::PurchaseOrders,
    Resource::CashVouchers,
    Resource::Tickets,
    Resource::Holidays,
    Resource::Attendance,
];

/// Baseline permission set implied by a role's hierarchy level.
///
/// Level 1 is the top of the hierarchy. Unknown levels (including the 0 used
/// for users without a role) contribute nothing, so resolution falls through
/// to explicit grants only.
pub fn hierarchy_defaults(level: i32) -> HashSet<(Resource, Permission)> {
    let mut set = HashSet::new();

    match level {
        // Administrator: everything
        1 => {
            for resource in Resource::ALL {
                for permission in Permission::ALL {
                    set.insert((resource, permission));
                }
            }
        }
        // Manager: read everything, work the business documents
        2 => {
            for resource in Resource::ALL {
                set.insert((resource, Permission::View));
            }
            for resource in MANAGER_EDITABLE {
                set.insert((resource, Permission::Create));
                set.insert((resource, Permission::Edit));
            }
        }
        // Staff: raise leads and tickets, record own attendance
        3 => {
            for resource in [Resource::Leads, Resource::Tickets, Resource::Attendance] {
                set.insert((resource, Permission::View));
                set.insert((resource, Permission::Create));
            }
            set.insert((Resource::Holidays, Permission::View));
        }
        _ => {}
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_string_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
        assert!("invoices".parse::<Resource>().is_err());
    }

    #[test]
    fn permission_string_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>().unwrap(), permission);
        }
        assert!("approve".parse::<Permission>().is_err());
    }

    #[test]
    fn admin_level_gets_everything() {
        let defaults = hierarchy_defaults(1);
        assert_eq!(defaults.len(), Resource::ALL.len() * Permission::ALL.len());
    }

    #[test]
    fn manager_cannot_delete_by_default() {
        let defaults = hierarchy_defaults(2);
        assert!(defaults.contains(&(Resource::Leads, Permission::Edit)));
        assert!(defaults.contains(&(Resource::Users, Permission::View)));
        assert!(!defaults.contains(&(Resource::Leads, Permission::Delete)));
        assert!(!defaults.contains(&(Resource::Users, Permission::Edit)));
    }

    #[test]
    fn unknown_level_is_empty() {
        assert!(hierarchy_defaults(0).is_empty());
        assert!(hierarchy_defaults(99).is_empty());
    }
}
