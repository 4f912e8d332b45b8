// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::{ComponentStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Simple liveness check. Returns 200 OK if the service is running.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

// =============================================================================
// Readiness Check
// =============================================================================

/// GET /ready
///
/// Readiness check. Only the document store can make the service unready.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = Vec::new();

    let store_healthy = state.store.health_check().await;
    let store = ComponentStatus::new(format!("store:{}", state.store.name()), store_healthy);
    components.push(if store_healthy {
        store
    } else {
        store.with_message("Store unreachable")
    });

    components.push(
        ComponentStatus::new("audit_logger", true).with_message(state.audit().name().to_string()),
    );

    components.push(match &state.sso {
        Some(verifier) => ComponentStatus::new("sso", true).with_message(if verifier.has_cached_keys() {
            "Key set cached"
        } else {
            "Key set not yet fetched"
        }),
        None => ComponentStatus::new("sso", true).with_message("Not configured"),
    });

    components.push(ComponentStatus::new("rate_limiter", true).with_message(format!(
        "{} active windows",
        state.rate_limiter.tracked_keys()
    )));

    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready: store_healthy,
            components,
        }),
    )
}
