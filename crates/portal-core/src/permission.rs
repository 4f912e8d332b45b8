// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission model.
//!
//! Permissions are a pure function of role. There is no per-user override:
//! any effective-access question reduces to "what is this user's role".

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::Role;

// =============================================================================
// Permission
// =============================================================================

/// Capabilities that endpoints can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// View the dashboard.
    ViewDashboard,
    /// Scan attendance QR codes.
    ScanQr,
    /// Record and edit attendance.
    ManageAttendance,
    /// Manage schedules, subjects and classes.
    ManageAcademic,
    /// Manage accounts, roles and identity claims.
    ManageUsers,
    /// View reports and recaps.
    ViewReports,
    /// Use the AI assistant proxy.
    AccessAi,
    /// Change system settings.
    ManageSystem,
}

impl Permission {
    /// Returns the permission name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "view-dashboard",
            Permission::ScanQr => "scan-qr",
            Permission::ManageAttendance => "manage-attendance",
            Permission::ManageAcademic => "manage-academic",
            Permission::ManageUsers => "manage-users",
            Permission::ViewReports => "view-reports",
            Permission::AccessAi => "access-ai",
            Permission::ManageSystem => "manage-system",
        }
    }

    /// Parses a permission from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "view-dashboard" => Some(Permission::ViewDashboard),
            "scan-qr" => Some(Permission::ScanQr),
            "manage-attendance" => Some(Permission::ManageAttendance),
            "manage-academic" => Some(Permission::ManageAcademic),
            "manage-users" => Some(Permission::ManageUsers),
            "view-reports" => Some(Permission::ViewReports),
            "access-ai" => Some(Permission::AccessAi),
            "manage-system" => Some(Permission::ManageSystem),
            _ => None,
        }
    }

    /// Returns all available permissions.
    pub fn all() -> &'static [Permission] {
        &[
            Permission::ViewDashboard,
            Permission::ScanQr,
            Permission::ManageAttendance,
            Permission::ManageAcademic,
            Permission::ManageUsers,
            Permission::ViewReports,
            Permission::AccessAi,
            Permission::ManageSystem,
        ]
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Permission Set
// =============================================================================

/// A set of permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a permission set from a list of permissions.
    pub fn from_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns `true` if the set contains the given permission.
    pub fn contains(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns `true` if the set contains all of the given permissions.
    pub fn contains_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.permissions.contains(p))
    }

    /// Returns `true` if the set contains any of the given permissions.
    pub fn contains_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.permissions.contains(p))
    }

    /// Returns the number of permissions in the set.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Returns an iterator over the permissions.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Returns the permission names sorted alphabetically.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.permissions.iter().map(|p| p.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self::from_permissions(iter)
    }
}

// =============================================================================
// Role Table
// =============================================================================

/// Returns the static permission grant for a role.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    use Permission::*;

    match role {
        Role::Admin | Role::Developer => &[
            ViewDashboard,
            ScanQr,
            ManageAttendance,
            ManageAcademic,
            ManageUsers,
            ViewReports,
            AccessAi,
            ManageSystem,
        ],
        Role::Headmaster => &[
            ViewDashboard,
            ManageAttendance,
            ManageAcademic,
            ViewReports,
            AccessAi,
        ],
        Role::CurriculumDeputy => &[ViewDashboard, ManageAcademic, ViewReports, AccessAi],
        Role::StudentAffairsDeputy => &[
            ViewDashboard,
            ScanQr,
            ManageAttendance,
            ViewReports,
            AccessAi,
        ],
        Role::FacilitiesDeputy => &[ViewDashboard, ViewReports, AccessAi],
        Role::Operator => &[ViewDashboard, ManageAcademic, ManageUsers, ViewReports],
        Role::HomeroomTeacher => &[
            ViewDashboard,
            ScanQr,
            ManageAttendance,
            ViewReports,
            AccessAi,
        ],
        Role::Teacher => &[ViewDashboard, ScanQr, ManageAttendance, AccessAi],
        Role::Counselor => &[ViewDashboard, ViewReports, AccessAi],
        Role::RegistrarStaff => &[ViewDashboard, ManageAcademic, ViewReports],
        Role::DutyOfficer => &[ViewDashboard, ScanQr, ManageAttendance],
        Role::ClassRepresentative => &[ViewDashboard, ScanQr],
        Role::Student | Role::Parent => &[ViewDashboard],
        Role::Guest => &[],
    }
}

/// Returns the permission set of a role given as a raw string.
///
/// Unknown roles yield the empty set.
pub fn permissions_of(role: &str) -> PermissionSet {
    match Role::parse(role) {
        Some(role) => permissions_for(role),
        None => PermissionSet::new(),
    }
}

/// Returns the permission set of a canonical role.
pub fn permissions_for(role: Role) -> PermissionSet {
    role_permissions(role).iter().copied().collect()
}

/// Returns `true` if the raw role string grants `permission`.
pub fn has_permission(role: &str, permission: Permission) -> bool {
    Role::parse(role).is_some_and(|r| role_permissions(r).contains(&permission))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_as_str() {
        assert_eq!(Permission::AccessAi.as_str(), "access-ai");
        assert_eq!(Permission::ManageUsers.to_string(), "manage-users");
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(Permission::parse("scan_qr"), Some(Permission::ScanQr));
        assert_eq!(Permission::parse("MANAGE_SYSTEM"), Some(Permission::ManageSystem));
        assert_eq!(Permission::parse("invalid"), None);
        for p in Permission::all() {
            assert_eq!(Permission::parse(p.as_str()), Some(*p));
        }
    }

    #[test]
    fn test_unknown_role_fails_closed() {
        assert!(permissions_of("not-a-real-role").is_empty());
        for p in Permission::all() {
            assert!(!has_permission("not-a-real-role", *p));
            assert!(!has_permission("", *p));
        }
    }

    #[test]
    fn test_guest_has_nothing() {
        assert!(permissions_for(Role::Guest).is_empty());
        assert!(permissions_of("GUEST").is_empty());
    }

    #[test]
    fn test_admin_has_everything() {
        let set = permissions_of("ADMIN");
        assert!(set.contains_all(Permission::all()));
        assert_eq!(permissions_for(Role::Developer).len(), Permission::all().len());
    }

    #[test]
    fn test_claim_roles() {
        assert!(has_permission("SISWA", Permission::ViewDashboard));
        assert!(!has_permission("SISWA", Permission::AccessAi));
        assert!(has_permission("GURU", Permission::AccessAi));
        assert!(has_permission("gtk", Permission::ScanQr));
        assert!(!has_permission("GURU", Permission::ManageUsers));
    }

    #[test]
    fn test_only_admin_tier_manages_users() {
        let managers: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|r| role_permissions(*r).contains(&Permission::ManageUsers))
            .collect();
        assert_eq!(managers, vec![Role::Admin, Role::Developer, Role::Operator]);
    }

    #[test]
    fn test_permission_set_ops() {
        let set: PermissionSet = [Permission::ScanQr, Permission::ViewDashboard].into_iter().collect();
        assert!(set.contains(Permission::ScanQr));
        assert!(set.contains_any(&[Permission::ManageSystem, Permission::ScanQr]));
        assert!(!set.contains_all(&[Permission::ManageSystem, Permission::ScanQr]));
        assert_eq!(set.names(), vec!["scan-qr", "view-dashboard"]);
    }
}
