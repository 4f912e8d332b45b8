// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use portal_core::{ClaimType, MasterRecord, Role, UserProfile};
use serde::{Deserialize, Serialize};

// =============================================================================
// Created
// =============================================================================

/// Wraps a body so it is sent with `201 Created`.
#[derive(Debug)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Readiness check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service is ready.
    pub ready: bool,
    /// Component statuses.
    pub components: Vec<ComponentStatus>,
}

/// Status of a system component.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Component name.
    pub name: String,
    /// Whether the component is healthy.
    pub healthy: bool,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    /// Creates a component status.
    pub fn new(name: impl Into<String>, healthy: bool) -> Self {
        Self {
            name: name.into(),
            healthy,
            message: None,
        }
    }

    /// Attaches a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Response for every endpoint that starts a session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// User id.
    pub uid: String,
    /// Session bearer token.
    pub token: String,
    /// Canonical role code.
    pub role: Role,
    /// Stored profile.
    pub profile: UserProfile,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

impl SessionResponse {
    /// Builds a session response for a profile.
    pub fn new(profile: UserProfile, token: String, expires_in: i64) -> Self {
        Self {
            uid: profile.uid.clone(),
            token,
            role: profile.role,
            profile,
            expires_in,
        }
    }
}

/// Caller's own profile with resolved permissions.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    /// Stored profile.
    pub profile: UserProfile,
    /// Canonical role code.
    pub role: Role,
    /// Permission names granted to the role.
    pub permissions: Vec<String>,
}

/// Self-activation result.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivationResponse {
    /// Session for the linked account.
    #[serde(flatten)]
    pub session: SessionResponse,
    /// Claimed master record id.
    pub master_id: String,
    /// `true` if an earlier orphaned credential was reused.
    pub reclaimed: bool,
}

// =============================================================================
// Lookup
// =============================================================================

/// Public view of an unclaimed master record.
///
/// Carries no verification material.
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    /// Primary key.
    pub id: String,
    /// Name as stored.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
}

impl LookupResponse {
    /// Projects a record into its public view.
    pub fn new(claim_type: ClaimType, record: MasterRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            claim_type,
        }
    }
}

// =============================================================================
// Admin and Audit
// =============================================================================

/// Result of an administrative role assignment.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleAssignedResponse {
    /// User id.
    pub uid: String,
    /// Role before the change.
    pub previous: Role,
    /// Role after the change.
    pub role: Role,
}

/// Accepted audit write.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditAcceptedResponse {
    /// Entry id.
    pub id: String,
}

// =============================================================================
// Tests
// =============================================================================
