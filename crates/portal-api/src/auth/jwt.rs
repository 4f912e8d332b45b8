// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token management.

use std::sync::Arc;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use portal_config::JwtConfig;
use portal_core::UserProfile;

use super::Claims;
use crate::error::{ApiError, ApiResult};

/// Signing algorithm for internal session tokens.
const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

// =============================================================================
// JwtManager
// =============================================================================

/// Issues and validates internal session tokens.
///
/// Session tokens are HMAC-signed with the configured secret. They are
/// distinct from federated ID tokens, which are verified by
/// [`SsoVerifier`](super::SsoVerifier) and never accepted as sessions.
#[derive(Clone)]
pub struct JwtManager {
    issuer: Arc<str>,
    expiration_secs: i64,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtManager {
    /// Creates a new manager from the session token configuration.
    pub fn new(config: &JwtConfig) -> ApiResult<Self> {
        let secret = config
            .secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::internal("Session secret is not configured"))?;

        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;

        Ok(Self {
            issuer: Arc::from(config.issuer.as_str()),
            expiration_secs: i64::try_from(config.expiration_secs).unwrap_or(i64::MAX),
            encoding_key: Arc::new(EncodingKey::from_secret(secret.expose().as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.expose().as_bytes())),
            validation: Arc::new(validation),
        })
    }

    /// Signs the given claims.
    pub fn create_token(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(SESSION_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Issues a session token for a profile using its current role.
    pub fn issue_for(&self, profile: &UserProfile) -> ApiResult<String> {
        let claims = Claims::for_profile(profile, self.expiration_secs).with_issuer(&*self.issuer);
        self.create_token(&claims)
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<TokenData<Claims>> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::unauthorized("Token has expired"),
            ErrorKind::InvalidToken => ApiError::unauthorized("Invalid token format"),
            ErrorKind::InvalidSignature => ApiError::unauthorized("Invalid token signature"),
            ErrorKind::InvalidIssuer => ApiError::unauthorized("Invalid token issuer"),
            ErrorKind::InvalidAlgorithm => ApiError::unauthorized("Invalid token algorithm"),
            _ => ApiError::unauthorized(format!("Token validation failed: {}", e)),
        })
    }

    /// Returns the token lifetime in seconds.
    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    /// Returns the issuer stamped on session tokens.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.issuer)
            .field("algorithm", &SESSION_ALGORITHM)
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
