// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token claims.

use chrono::{DateTime, Utc};
use portal_core::{normalize_role, Role, UserProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an internal session token.
///
/// Permissions are never embedded. They are recomputed from `role` on every
/// request, so a token minted before a role change still resolves through
/// the current permission table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject - the user uid.
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// JWT ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Canonical role code at issuance.
    #[serde(default)]
    pub role: String,

    /// User's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// User's email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    /// Creates new claims for a user.
    pub fn new(user_id: impl Into<String>, role: Role, expires_in_secs: i64) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user_id.into(),
            exp: now + expires_in_secs,
            iat: now,
            iss: None,
            jti: Some(Uuid::now_v7().to_string()),
            role: role.code().to_string(),
            name: None,
            email: None,
        }
    }

    /// Creates claims describing a stored profile.
    pub fn for_profile(profile: &UserProfile, expires_in_secs: i64) -> Self {
        Self::new(&profile.uid, profile.role, expires_in_secs)
            .with_email(&profile.email)
            .with_name(&profile.display_name)
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Returns the role, re-normalised. Anything unrecognised is a guest.
    pub fn role(&self) -> Role {
        normalize_role(&self.role, Role::Guest)
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Sets the user's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the user's email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
