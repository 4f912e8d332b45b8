// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Claim submission and history.

use axum::{extract::State, response::IntoResponse, Json};
use portal_core::{AuditAction, AuditLog, ClaimType, SubmitClaim};
use serde::Deserialize;

use super::spawn_audit;
use crate::error::{ApiResult, ValidationErrors};
use crate::extractors::{Auth, Validate, ValidatedJson};
use crate::response::Created;
use crate::state::AppState;

/// Claim submission body.
#[derive(Debug, Deserialize)]
pub struct SubmitClaimRequest {
    /// Record type.
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    /// Master record id.
    pub target_id: String,
    /// Secondary verification input.
    pub secondary_id: String,
}

impl Validate for SubmitClaimRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.target_id.trim().is_empty() {
            errors.add("target_id", "Record id is required");
        }
        if self.secondary_id.trim().is_empty() {
            errors.add("secondary_id", "Secondary verification is required");
        }
        errors
    }
}

/// POST /api/claims
///
/// Submits a claim for the caller. Fails with 409 while the caller has a
/// pending or reviewing claim.
pub async fn submit_claim(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    ValidatedJson(request): ValidatedJson<SubmitClaimRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.accounts.profile(&auth_ctx.user_id).await?;

    let claim = state
        .claims
        .submit(SubmitClaim {
            user_id: profile.uid,
            user_name: profile.display_name,
            user_email: profile.email,
            claim_type: request.claim_type,
            target_id: request.target_id,
            secondary_input: request.secondary_id,
        })
        .await?;

    spawn_audit(
        &state,
        AuditLog::claim(AuditAction::ClaimSubmit, &claim, &auth_ctx.user_id)
            .with_client_ip(auth_ctx.client_ip)
            .with_request_id(auth_ctx.request_id.to_string()),
    );

    Ok(Created(claim))
}

/// GET /api/claims/me
///
/// The caller's claims, newest first. A denied store read yields `[]`.
pub async fn my_claims(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let claims = state.claims.list_for_user(&auth_ctx.user_id).await?;
    Ok(Json(claims))
}
