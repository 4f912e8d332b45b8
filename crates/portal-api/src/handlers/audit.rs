// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client-submitted audit events.

use axum::{extract::State, response::IntoResponse};
use portal_core::{audit, ActionResult, AuditAction, AuditLog, AuditResource};
use serde::Deserialize;

use crate::auth::ANONYMOUS_USER;
use crate::error::{ApiResult, ValidationErrors};
use crate::extractors::{ClientIp, OptionalAuth, RequestId, Validate, ValidatedJson};
use crate::response::{AuditAcceptedResponse, Created};
use crate::state::AppState;

/// Client audit event body.
#[derive(Debug, Deserialize)]
pub struct ClientAuditRequest {
    /// Client-side action name.
    pub action: String,
    /// What the action touched.
    #[serde(default)]
    pub target: String,
    /// Whether the action succeeded.
    pub success: bool,
    /// Free-form details.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl Validate for ClientAuditRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.action.trim().is_empty() {
            errors.add("action", "Action is required");
        }
        errors
    }
}

/// POST /api/audit
///
/// Records a client event. Write failures are logged and the event is
/// still acknowledged.
pub async fn record_event(
    State(state): State<AppState>,
    OptionalAuth(auth_ctx): OptionalAuth,
    ClientIp(client_ip): ClientIp,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ClientAuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let user_id = auth_ctx
        .map(|ctx| ctx.user_id)
        .unwrap_or_else(|| ANONYMOUS_USER.to_string());

    let result = if request.success {
        ActionResult::Success
    } else {
        ActionResult::failure(request.action.clone())
    };

    let entry = AuditLog::new(
        AuditAction::ClientEvent,
        AuditResource::new("client", request.target.as_str()),
        result,
    )
    .with_user(user_id, client_ip)
    .with_request_id(request_id.to_string())
    .with_details(serde_json::json!({
        "action": request.action,
        "details": request.details,
    }));

    let id = entry.id.to_string();
    audit::record(state.audit().as_ref(), entry).await;

    Ok(Created(AuditAcceptedResponse { id }))
}
