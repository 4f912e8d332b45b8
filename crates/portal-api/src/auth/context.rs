// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;
use std::sync::Arc;

use portal_core::{permissions_for, Permission, PermissionSet, Role};
use serde::Serialize;
use uuid::Uuid;

use super::Claims;

/// User id recorded for unauthenticated requests.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Authentication context for a request.
///
/// Attached to request extensions by the auth layer. The role is the
/// re-normalised token role, and the permission set is derived from it at
/// attach time.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// User ID.
    pub user_id: String,
    /// Resolved role.
    pub role: Role,
    /// Resolved permissions.
    #[serde(skip)]
    pub permissions: Arc<PermissionSet>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Request ID for tracing.
    pub request_id: Uuid,
    /// User's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// User's email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthContext {
    /// Creates a context from validated session claims.
    pub fn from_claims(claims: &Claims) -> Self {
        let role = claims.role();
        Self {
            user_id: claims.sub.clone(),
            role,
            permissions: Arc::new(permissions_for(role)),
            client_ip: None,
            request_id: Uuid::now_v7(),
            name: claims.name.clone(),
            email: claims.email.clone(),
        }
    }

    /// Creates an anonymous context (for unauthenticated requests).
    pub fn anonymous() -> Self {
        Self {
            user_id: ANONYMOUS_USER.to_string(),
            role: Role::Guest,
            permissions: Arc::new(PermissionSet::new()),
            client_ip: None,
            request_id: Uuid::now_v7(),
            name: None,
            email: None,
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `true` if the context has the given permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns `true` if the context has all of the given permissions.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_all(permissions)
    }

    /// Returns `true` if the context has any of the given permissions.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        self.permissions.contains_any(permissions)
    }

    /// Returns `true` if this is an anonymous context.
    pub fn is_anonymous(&self) -> bool {
        self.user_id == ANONYMOUS_USER
    }

    /// Returns the client IP as a string for audit records.
    pub fn client_ip_string(&self) -> Option<String> {
        self.client_ip.map(|ip| ip.to_string())
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::new("user123", Role::Teacher, 3600);
        let ctx = AuthContext::from_claims(&claims);

        assert_eq!(ctx.user_id, "user123");
        assert_eq!(ctx.role, Role::Teacher);
        assert!(ctx.has_permission(Permission::AccessAi));
        assert!(!ctx.has_permission(Permission::ManageUsers));
        assert!(!ctx.is_anonymous());
    }

    #[test]
    fn test_unknown_role_claim_has_no_permissions() {
        let mut claims = Claims::new("user", Role::Guest, 3600);
        claims.role = "SUPERUSER".to_string();

        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.role, Role::Guest);
        assert!(ctx.permissions.is_empty());
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = AuthContext::anonymous().with_client_ip("10.0.0.1".parse().unwrap());

        assert!(ctx.is_anonymous());
        assert!(ctx.permissions.is_empty());
        assert_eq!(ctx.client_ip_string().as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_admin_permissions() {
        let ctx = AuthContext::from_claims(&Claims::new("root", Role::Admin, 3600));
        assert!(ctx.has_all_permissions(Permission::all()));
        assert!(ctx.has_any_permission(&[Permission::ManageUsers]));
    }
}
