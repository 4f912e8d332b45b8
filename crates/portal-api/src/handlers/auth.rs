// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, response::IntoResponse, Json};
use portal_core::{
    ActionResult, ActivationRequest, AuditAction, AuditLog, AuditResource, ClaimType,
};
use serde::Deserialize;

use super::spawn_audit;
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, ClientIp, Validate, ValidatedJson};
use crate::response::{ActivationResponse, Created, MeResponse, SessionResponse};
use crate::state::AppState;

fn session_for(state: &AppState, profile: portal_core::UserProfile) -> ApiResult<SessionResponse> {
    let token = state.jwt().issue_for(&profile)?;
    Ok(SessionResponse::new(profile, token, state.jwt().expiration_secs()))
}

fn require_email(errors: &mut ValidationErrors, email: &str) {
    if !email.contains('@') {
        errors.add("email", "A valid email address is required");
    }
}

// =============================================================================
// Register
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors
    }
}

/// POST /api/auth/register
///
/// Creates a password account with an unlinked guest profile.
pub async fn register(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .accounts
        .register(&request.email, &request.password, &request.display_name)
        .await?;

    spawn_audit(
        &state,
        AuditLog::new(
            AuditAction::Register,
            AuditResource::user(&profile.uid),
            ActionResult::Success,
        )
        .with_user(&profile.uid, client_ip),
    );

    Ok(Created(session_for(&state, profile)?))
}

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors
    }
}

/// POST /api/auth/login
///
/// Verifies a password and returns a session token.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = match state.accounts.login(&request.email, &request.password).await {
        Ok(profile) => profile,
        Err(e) => {
            spawn_audit(&state, AuditLog::login(request.email.trim(), client_ip, false));
            return Err(e.into());
        }
    };

    spawn_audit(&state, AuditLog::login(&profile.uid, client_ip, true));
    tracing::info!(user_id = %profile.uid, role = %profile.role, "User logged in");

    Ok(Json(session_for(&state, profile)?))
}

// =============================================================================
// Self-Activation
// =============================================================================

/// Self-activation request body.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Display name; defaults to the record's name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Record type.
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    /// Master record id.
    pub primary_id: String,
    /// Verification code.
    pub secondary_id: String,
}

impl Validate for ActivateRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_email(&mut errors, &self.email);
        if self.primary_id.trim().is_empty() {
            errors.add("primary_id", "Record id is required");
        }
        if self.secondary_id.trim().is_empty() {
            errors.add("secondary_id", "Verification code is required");
        }
        errors
    }
}

/// POST /api/auth/activate
///
/// Creates (or reclaims) a credential and links it to a master record
/// without administrator review.
pub async fn activate(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<ActivateRequest>,
) -> ApiResult<impl IntoResponse> {
    let claim_type = request.claim_type;
    let activation = state
        .accounts
        .activate(ActivationRequest {
            email: request.email,
            password: request.password,
            display_name: request.display_name,
            claim_type,
            primary_id: request.primary_id,
            secondary_id: request.secondary_id,
        })
        .await?;

    spawn_audit(
        &state,
        AuditLog::activation(&activation.profile.uid, claim_type, &activation.master.id)
            .with_client_ip(client_ip),
    );

    let master_id = activation.master.id;
    Ok(Created(ActivationResponse {
        session: session_for(&state, activation.profile)?,
        master_id,
        reclaimed: activation.reclaimed,
    }))
}

// =============================================================================
// SSO Login
// =============================================================================

/// SSO login request body.
#[derive(Debug, Default, Deserialize)]
pub struct SsoLoginRequest {
    /// Provider-issued ID token.
    #[serde(default)]
    pub id_token: Option<String>,
}

impl Validate for SsoLoginRequest {}

/// POST /api/auth/login-sso
///
/// Exchanges a provider ID token for a portal session. An existing profile
/// keeps its stored role.
pub async fn login_sso(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<SsoLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let verifier = state
        .sso
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("SSO login is not enabled"))?;

    let identity = verifier
        .verify(request.id_token.as_deref().unwrap_or_default())
        .await?;

    let login = state
        .accounts
        .resolve_federated(&identity.email, identity.name.as_deref(), identity.role.as_deref())
        .await?;

    spawn_audit(
        &state,
        AuditLog::sso_login(&login.profile.uid, login.profile.role, login.created)
            .with_client_ip(client_ip),
    );
    tracing::info!(
        user_id = %login.profile.uid,
        role = %login.profile.role,
        created = login.created,
        "SSO login"
    );

    Ok(Json(session_for(&state, login.profile)?))
}

// =============================================================================
// Current User
// =============================================================================

/// GET /api/auth/me
///
/// Returns the caller's profile with the permissions of the session role.
pub async fn current_user(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let profile = state.accounts.profile(&auth_ctx.user_id).await?;
    let permissions = auth_ctx
        .permissions
        .names()
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Json(MeResponse {
        profile,
        role: auth_ctx.role,
        permissions,
    }))
}
