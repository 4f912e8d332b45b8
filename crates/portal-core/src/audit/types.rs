// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core audit log types.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ClaimRequest, ClaimType};
use crate::role::Role;

// =============================================================================
// Audit Log Entry
// =============================================================================

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique log entry ID.
    pub id: Uuid,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the event.
    pub severity: AuditSeverity,

    /// Acting user, if known.
    pub user_id: Option<String>,

    /// Client IP address.
    pub client_ip: Option<IpAddr>,

    /// The action that was performed.
    pub action: AuditAction,

    /// The resource that was affected.
    pub resource: AuditResource,

    /// Additional details about the action.
    pub details: serde_json::Value,

    /// The result of the action.
    pub result: ActionResult,

    /// Request id for correlating with tracing output.
    pub request_id: Option<String>,
}

impl AuditLog {
    /// Creates an entry with the action's default severity.
    pub fn new(action: AuditAction, resource: AuditResource, result: ActionResult) -> Self {
        let severity = match &result {
            ActionResult::Success => action.default_severity(),
            ActionResult::Failure { .. } | ActionResult::Denied { .. } => AuditSeverity::Warning,
        };
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            user_id: None,
            client_ip: None,
            action,
            resource,
            details: serde_json::Value::Null,
            result,
            request_id: None,
        }
    }

    /// Sets the acting user and client address.
    pub fn with_user(mut self, user_id: impl Into<String>, client_ip: Option<IpAddr>) -> Self {
        self.user_id = Some(user_id.into());
        self.client_ip = client_ip;
        self
    }

    /// Sets the client address.
    pub fn with_client_ip(mut self, client_ip: Option<IpAddr>) -> Self {
        self.client_ip = client_ip;
        self
    }

    /// Attaches structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Sets the request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    // -------------------------------------------------------------------------
    // Convenience constructors
    // -------------------------------------------------------------------------

    /// Password login attempt.
    pub fn login(user_id: impl Into<String>, client_ip: Option<IpAddr>, success: bool) -> Self {
        let user_id = user_id.into();
        let (action, result) = if success {
            (AuditAction::Login, ActionResult::Success)
        } else {
            (AuditAction::LoginFailed, ActionResult::failure("invalid credentials"))
        };
        Self::new(action, AuditResource::user(&user_id), result).with_user(user_id, client_ip)
    }

    /// Federated login.
    pub fn sso_login(uid: impl Into<String>, role: Role, created: bool) -> Self {
        let uid = uid.into();
        Self::new(AuditAction::SsoLogin, AuditResource::user(&uid), ActionResult::Success)
            .with_user(uid, None)
            .with_details(serde_json::json!({ "role": role.code(), "created": created }))
    }

    /// Claim lifecycle transition performed by `actor`.
    pub fn claim(action: AuditAction, claim: &ClaimRequest, actor: impl Into<String>) -> Self {
        Self::new(action, AuditResource::claim(&claim.id), ActionResult::Success)
            .with_user(actor, None)
            .with_details(serde_json::json!({
                "claim_type": claim.claim_type.as_str(),
                "target_id": claim.target_id,
                "claimant": claim.user_id,
                "status": claim.status.as_str(),
            }))
    }

    /// Completed self-activation.
    pub fn activation(uid: impl Into<String>, claim_type: ClaimType, master_id: &str) -> Self {
        let uid = uid.into();
        Self::new(
            AuditAction::Activate,
            AuditResource::master(claim_type, master_id),
            ActionResult::Success,
        )
        .with_user(uid, None)
    }

    /// Role change made by an administrator.
    pub fn role_change(actor: impl Into<String>, target_uid: &str, from: Role, to: Role) -> Self {
        Self::new(AuditAction::RoleChange, AuditResource::user(target_uid), ActionResult::Success)
            .with_user(actor, None)
            .with_details(serde_json::json!({ "from": from.code(), "to": to.code() }))
    }

    /// Request refused by the authorization gate.
    pub fn access_denied(
        user_id: Option<String>,
        client_ip: Option<IpAddr>,
        endpoint: &str,
        reason: impl Into<String>,
    ) -> Self {
        let mut log = Self::new(
            AuditAction::AccessDenied,
            AuditResource::api(endpoint),
            ActionResult::denied(reason),
        );
        log.user_id = user_id;
        log.client_ip = client_ip;
        log
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Audit event severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    /// Routine event.
    #[default]
    Info,
    /// Failed or refused operation.
    Warning,
    /// Security-relevant change.
    Critical,
}

impl AuditSeverity {
    /// Returns the severity name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "info",
            AuditSeverity::Warning => "warning",
            AuditSeverity::Critical => "critical",
        }
    }
}

// =============================================================================
// Action
// =============================================================================

/// Auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Password login.
    Login,
    /// Rejected password login.
    LoginFailed,
    /// Federated login.
    SsoLogin,
    /// Account registration.
    Register,
    /// Self-activation against a master record.
    Activate,
    /// Claim submitted.
    ClaimSubmit,
    /// Claim opened for review.
    ClaimReview,
    /// Claim approved.
    ClaimApprove,
    /// Claim rejected.
    ClaimReject,
    /// Role changed by an administrator.
    RoleChange,
    /// AI proxy call.
    AiRequest,
    /// Request refused by the gate.
    AccessDenied,
    /// Event submitted by a client.
    ClientEvent,
}

impl AuditAction {
    /// Returns the action name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::SsoLogin => "sso_login",
            AuditAction::Register => "register",
            AuditAction::Activate => "activate",
            AuditAction::ClaimSubmit => "claim_submit",
            AuditAction::ClaimReview => "claim_review",
            AuditAction::ClaimApprove => "claim_approve",
            AuditAction::ClaimReject => "claim_reject",
            AuditAction::RoleChange => "role_change",
            AuditAction::AiRequest => "ai_request",
            AuditAction::AccessDenied => "access_denied",
            AuditAction::ClientEvent => "client_event",
        }
    }

    /// Returns the severity used when the action succeeds.
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            AuditAction::ClaimApprove | AuditAction::RoleChange | AuditAction::Activate => {
                AuditSeverity::Critical
            }
            AuditAction::LoginFailed | AuditAction::AccessDenied => AuditSeverity::Warning,
            _ => AuditSeverity::Info,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Resource
// =============================================================================

/// The resource an action touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResource {
    /// Resource type.
    pub resource_type: String,
    /// Resource id.
    pub resource_id: String,
}

impl AuditResource {
    /// Creates a resource reference.
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// A user profile.
    pub fn user(uid: impl Into<String>) -> Self {
        Self::new("user", uid)
    }

    /// A claim request.
    pub fn claim(id: impl Into<String>) -> Self {
        Self::new("claim", id)
    }

    /// A master record.
    pub fn master(claim_type: ClaimType, id: impl Into<String>) -> Self {
        Self::new(claim_type.collection().as_str(), id)
    }

    /// An API endpoint.
    pub fn api(endpoint: impl Into<String>) -> Self {
        Self::new("api", endpoint)
    }

    /// Returns `type/id`.
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.resource_type, self.resource_id)
    }
}

// =============================================================================
// Result
// =============================================================================

/// Outcome of an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult {
    /// Completed.
    Success,
    /// Attempted and failed.
    Failure {
        /// Failure reason.
        reason: String,
    },
    /// Refused before execution.
    Denied {
        /// Refusal reason.
        reason: String,
    },
}

impl ActionResult {
    /// Creates a failure result.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Creates a denied result.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    /// Returns `true` on success.
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success)
    }

    /// Returns the result name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionResult::Success => "success",
            ActionResult::Failure { .. } => "failure",
            ActionResult::Denied { .. } => "denied",
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Query filter for audit entries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Match the acting user.
    pub user_id: Option<String>,
    /// Match any of these actions.
    pub actions: Vec<AuditAction>,
    /// Match the resource type.
    pub resource_type: Option<String>,
    /// Minimum severity.
    pub min_severity: Option<AuditSeverity>,
    /// Entries at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Newest first.
    pub descending: bool,
}

impl AuditFilter {
    /// Creates a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by acting user.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Filters by action.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Filters by resource type.
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Filters by minimum severity.
    pub fn min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Limits the result count.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns newest entries first.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Returns `true` if the entry matches every set criterion.
    pub fn matches(&self, log: &AuditLog) -> bool {
        if let Some(user_id) = &self.user_id {
            if log.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }
        if !self.actions.is_empty() && !self.actions.contains(&log.action) {
            return false;
        }
        if let Some(resource_type) = &self.resource_type {
            if &log.resource.resource_type != resource_type {
                return false;
            }
        }
        if let Some(min) = self.min_severity {
            if log.severity < min {
                return false;
            }
        }
        if let Some(from) = self.from {
            if log.timestamp < from {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_login_is_warning() {
        let log = AuditLog::login("u1", None, false);
        assert_eq!(log.action, AuditAction::LoginFailed);
        assert_eq!(log.severity, AuditSeverity::Warning);
        assert!(!log.result.is_success());
    }

    #[test]
    fn test_role_change_is_critical() {
        let log = AuditLog::role_change("admin", "u1", Role::Guest, Role::Operator);
        assert_eq!(log.severity, AuditSeverity::Critical);
        assert_eq!(log.details["to"], "OPERATOR");
        assert_eq!(log.resource.full_path(), "user/u1");
    }

    #[test]
    fn test_filter() {
        let log = AuditLog::sso_login("u1", Role::Teacher, true);
        assert!(AuditFilter::new().matches(&log));
        assert!(AuditFilter::new().user("u1").action(AuditAction::SsoLogin).matches(&log));
        assert!(!AuditFilter::new().user("u2").matches(&log));
        assert!(!AuditFilter::new().min_severity(AuditSeverity::Critical).matches(&log));
        assert!(!AuditFilter::new().resource_type("claim").matches(&log));
    }

    #[test]
    fn test_result_serialization() {
        let json = serde_json::to_value(ActionResult::denied("rate limited")).unwrap();
        assert_eq!(json["status"], "denied");
        assert_eq!(json["reason"], "rate limited");
    }
}
