// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Administrator handlers: claim review and role assignment.
//!
//! Every route here sits behind `manage-users`.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use portal_core::{AuditAction, AuditLog, Role};
use serde::Deserialize;

use super::spawn_audit;
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, StatusQuery, Validate, ValidatedJson};
use crate::response::RoleAssignedResponse;
use crate::state::AppState;

// =============================================================================
// Claims
// =============================================================================

/// GET /api/admin/claims?status=
///
/// Lists claims by status, newest first. Defaults to pending.
pub async fn list_claims(
    State(state): State<AppState>,
    StatusQuery(filter): StatusQuery,
) -> ApiResult<impl IntoResponse> {
    let claims = state.claims.list_by_status(filter).await?;
    Ok(Json(claims))
}

/// POST /api/admin/claims/{id}/review
///
/// Opens a claim for review and returns it with its master record.
pub async fn review_claim(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    Path(claim_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let view = state.claims.open_for_review(&claim_id, &auth_ctx.user_id).await?;

    spawn_audit(
        &state,
        AuditLog::claim(AuditAction::ClaimReview, &view.claim, &auth_ctx.user_id)
            .with_client_ip(auth_ctx.client_ip),
    );

    Ok(Json(view))
}

/// POST /api/admin/claims/{id}/approve
///
/// Approves a claim, linking the profile and claiming the record in one
/// commit. A claim not yet opened for review, or a lost race, answers 409.
pub async fn approve_claim(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    Path(claim_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let claim = state.claims.approve(&claim_id, &auth_ctx.user_id).await?;

    spawn_audit(
        &state,
        AuditLog::claim(AuditAction::ClaimApprove, &claim, &auth_ctx.user_id)
            .with_client_ip(auth_ctx.client_ip),
    );

    Ok(Json(claim))
}

/// Rejection body.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Reason shown to the claimant.
    #[serde(default)]
    pub reason: String,
}

impl Validate for RejectRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.reason.trim().is_empty() {
            errors.add("reason", "A rejection reason is required");
        }
        errors
    }
}

/// POST /api/admin/claims/{id}/reject
pub async fn reject_claim(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    Path(claim_id): Path<String>,
    ValidatedJson(request): ValidatedJson<RejectRequest>,
) -> ApiResult<impl IntoResponse> {
    let claim = state
        .claims
        .reject(&claim_id, &auth_ctx.user_id, &request.reason)
        .await?;

    spawn_audit(
        &state,
        AuditLog::claim(AuditAction::ClaimReject, &claim, &auth_ctx.user_id)
            .with_client_ip(auth_ctx.client_ip),
    );

    Ok(Json(claim))
}

// =============================================================================
// Roles
// =============================================================================

/// Role assignment body.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    /// Role code, English name or alias.
    pub role: String,
}

impl AssignRoleRequest {
    fn parsed(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

impl Validate for AssignRoleRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.parsed().is_none() {
            errors.add("role", format!("Unknown role '{}'", self.role));
        }
        errors
    }
}

/// PUT /api/admin/users/{uid}/role
///
/// Explicit administrative role assignment. Unknown role names are
/// rejected rather than falling back to guest.
pub async fn assign_role(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    Path(uid): Path<String>,
    ValidatedJson(request): ValidatedJson<AssignRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let role = request
        .parsed()
        .ok_or_else(|| ApiError::validation(format!("Unknown role '{}'", request.role)))?;
    let previous = state.accounts.assign_role(&uid, role).await?;

    spawn_audit(
        &state,
        AuditLog::role_change(&auth_ctx.user_id, &uid, previous, role)
            .with_client_ip(auth_ctx.client_ip),
    );

    Ok(Json(RoleAssignedResponse {
        uid,
        previous,
        role,
    }))
}
