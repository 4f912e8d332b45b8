// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Generative AI proxy.
//!
//! The request body is forwarded unchanged to the configured upstream and
//! the upstream status and body are relayed unchanged to the caller. The
//! API key never leaves the server.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use portal_core::{ActionResult, AuditAction, AuditLog, AuditResource};

use super::spawn_audit;
use crate::auth::ANONYMOUS_USER;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ClientIp, OptionalAuth, RequestId};
use crate::state::AppState;

/// Header carrying the upstream API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// POST /api/gemini
pub async fn ai_proxy(
    State(state): State<AppState>,
    OptionalAuth(auth_ctx): OptionalAuth,
    ClientIp(client_ip): ClientIp,
    RequestId(request_id): RequestId,
    body: Bytes,
) -> ApiResult<Response> {
    let ai = &state.config.ai;
    if !ai.enabled {
        return Err(ApiError::service_unavailable("AI proxy is not enabled"));
    }
    if body.is_empty() {
        return Err(ApiError::bad_request("Request body is required"));
    }

    let user_id = auth_ctx
        .as_ref()
        .map(|ctx| ctx.user_id.clone())
        .unwrap_or_else(|| ANONYMOUS_USER.to_string());

    let mut upstream = state
        .http_client
        .post(ai.endpoint())
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = &ai.api_key {
        upstream = upstream.header(API_KEY_HEADER, key.expose());
    }

    let result = async {
        let response = upstream.body(body).send().await?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let bytes = response.bytes().await?;
        Ok::<_, reqwest::Error>((status, content_type, bytes))
    }
    .await;

    let (status, content_type, bytes) = match result {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "AI upstream unreachable");
            spawn_audit(
                &state,
                AuditLog::new(
                    AuditAction::AiRequest,
                    AuditResource::api("/api/gemini"),
                    ActionResult::failure("upstream unreachable"),
                )
                .with_user(&user_id, client_ip)
                .with_request_id(request_id.to_string()),
            );
            return Err(e.into());
        }
    };

    let outcome = if status.is_success() {
        ActionResult::Success
    } else {
        ActionResult::failure(format!("upstream status {}", status.as_u16()))
    };
    spawn_audit(
        &state,
        AuditLog::new(AuditAction::AiRequest, AuditResource::api("/api/gemini"), outcome)
            .with_user(&user_id, client_ip)
            .with_request_id(request_id.to_string())
            .with_details(serde_json::json!({
                "model": ai.model,
                "status": status.as_u16(),
                "response_bytes": bytes.len(),
            })),
    );
    tracing::info!(user_id = %user_id, status = status.as_u16(), "AI proxy call");

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::from_u16(status.as_u16())
        .map_err(|e| ApiError::bad_gateway(e.to_string()))?;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        content_type.unwrap_or_else(|| HeaderValue::from_static("application/json")),
    );
    Ok(response)
}
