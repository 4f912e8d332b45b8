// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: liveness and readiness
//! - [`auth`]: registration, login, self-activation, SSO and `/me`
//! - [`lookup`]: public master record lookup
//! - [`claims`]: claim submission and history
//! - [`admin`]: claim review and role assignment
//! - [`ai`]: generative AI proxy
//! - [`audit`]: client-submitted audit events

mod admin;
mod ai;
mod audit;
mod auth;
mod claims;
mod health;
mod lookup;

pub use admin::*;
pub use ai::*;
pub use audit::*;
pub use auth::*;
pub use claims::*;
pub use health::*;
pub use lookup::*;

use portal_core::AuditLog;

use crate::state::AppState;

/// Writes an audit entry in the background.
pub(crate) fn spawn_audit(state: &AppState, entry: AuditLog) {
    let logger = state.audit().clone();
    tokio::spawn(async move {
        portal_core::audit::record(logger.as_ref(), entry).await;
    });
}
