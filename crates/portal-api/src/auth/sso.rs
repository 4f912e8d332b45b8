// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Federated ID token verification.
//!
//! ID tokens from the school's identity provider are verified against the
//! provider's published JWKS. The key set is fetched on first use and kept
//! in a process-wide cache. A token whose `kid` is not in the cached set
//! forces exactly one refresh; if the key is still missing the token is
//! rejected. There is no fallback to unverified claims.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use portal_config::SsoConfig;
use serde_json::Value;
use thiserror::Error;

/// Clock skew tolerated on provider tokens, in seconds.
const SSO_LEEWAY_SECS: u64 = 60;

// =============================================================================
// SsoError
// =============================================================================

/// Federated token verification errors.
#[derive(Debug, Error)]
pub enum SsoError {
    /// No token was supplied.
    #[error("ID token is required")]
    MissingToken,

    /// The verified token carries no email claim.
    #[error("ID token has no email claim")]
    MissingEmail,

    /// The token header has no `kid`.
    #[error("ID token has no key id")]
    MissingKeyId,

    /// The token algorithm is not on the allowlist.
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The `kid` is unknown even after refreshing the key set.
    #[error("Signing key not found: {0}")]
    KeyNotFound(String),

    /// The matching JWK cannot verify this token.
    #[error("Invalid signing key: {0}")]
    InvalidJwk(String),

    /// The key set could not be fetched.
    #[error("Key set fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Signature or claim validation failed.
    #[error("Invalid ID token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

// =============================================================================
// SsoIdentity
// =============================================================================

/// Identity asserted by a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoIdentity {
    /// Provider subject.
    pub subject: Option<String>,
    /// Email address, lowercased.
    pub email: String,
    /// Display name claim.
    pub name: Option<String>,
    /// Raw provider-side role claim. Normalised by the caller.
    pub role: Option<String>,
}

// =============================================================================
// SsoVerifier
// =============================================================================

#[derive(Debug, Clone)]
struct CachedJwks {
    jwks: JwkSet,
    expires_at: Option<Instant>,
}

impl CachedJwks {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| at > Instant::now())
    }
}

/// Verifies provider ID tokens with a cached key set.
///
/// Cloning shares the cache, so one instance lives in the application state
/// for the process lifetime.
#[derive(Debug, Clone)]
pub struct SsoVerifier {
    client: reqwest::Client,
    issuer: Arc<str>,
    audience: Arc<str>,
    jwks_url: Arc<str>,
    algorithms: Arc<[Algorithm]>,
    role_claim: Arc<str>,
    name_claim: Arc<str>,
    jwks_ttl: Option<Duration>,
    jwks_cache: Arc<DashMap<String, CachedJwks>>,
}

impl SsoVerifier {
    /// Creates a verifier from the SSO configuration.
    pub fn new(config: &SsoConfig) -> Result<Self, SsoError> {
        let algorithms = config
            .algorithms
            .iter()
            .map(|name| {
                Algorithm::from_str(name).map_err(|_| SsoError::UnsupportedAlgorithm(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            client,
            issuer: Arc::from(config.issuer.as_str()),
            audience: Arc::from(config.audience.as_str()),
            jwks_url: Arc::from(config.jwks_url.as_str()),
            algorithms: Arc::from(algorithms),
            role_claim: Arc::from(config.role_claim.as_str()),
            name_claim: Arc::from(config.name_claim.as_str()),
            jwks_ttl: config.jwks_cache_ttl(),
            jwks_cache: Arc::new(DashMap::new()),
        })
    }

    /// Verifies an ID token and extracts the asserted identity.
    pub async fn verify(&self, token: &str) -> Result<SsoIdentity, SsoError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SsoError::MissingToken);
        }

        let header = decode_header(token)?;
        if !self.algorithms.contains(&header.alg) {
            return Err(SsoError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.as_deref().ok_or(SsoError::MissingKeyId)?;

        let jwks = self.get_jwks().await?;
        let decoding_key = match find_jwk(&jwks, kid) {
            Some(key) => decoding_key_for(key, header.alg)?,
            None => {
                tracing::info!(kid = %kid, "Unknown signing key, refreshing key set");
                let refreshed = self.refresh_jwks().await?;
                let key = find_jwk(&refreshed, kid)
                    .ok_or_else(|| SsoError::KeyNotFound(kid.to_string()))?;
                decoding_key_for(key, header.alg)?
            }
        };

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&*self.issuer]);
        validation.set_audience(&[&*self.audience]);
        validation
            .required_spec_claims
            .extend(["iss".to_string(), "aud".to_string()]);
        validation.leeway = SSO_LEEWAY_SECS;

        let data = decode::<Value>(token, &decoding_key, &validation)?;
        let claims = data.claims;

        let email = string_claim(&claims, "email")
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or(SsoError::MissingEmail)?;

        Ok(SsoIdentity {
            subject: string_claim(&claims, "sub"),
            email,
            name: string_claim(&claims, &self.name_claim),
            role: string_claim(&claims, &self.role_claim),
        })
    }

    /// Returns `true` if a key set is cached.
    pub fn has_cached_keys(&self) -> bool {
        self.jwks_cache.contains_key(&*self.jwks_url)
    }

    async fn get_jwks(&self) -> Result<JwkSet, SsoError> {
        if let Some(entry) = self.jwks_cache.get(&*self.jwks_url) {
            if entry.is_fresh() {
                return Ok(entry.jwks.clone());
            }
        }
        self.refresh_jwks().await
    }

    async fn refresh_jwks(&self) -> Result<JwkSet, SsoError> {
        let jwks: JwkSet = self
            .client
            .get(&*self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(url = %self.jwks_url, keys = jwks.keys.len(), "Fetched provider key set");

        self.jwks_cache.insert(
            self.jwks_url.to_string(),
            CachedJwks {
                jwks: jwks.clone(),
                expires_at: self.jwks_ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(jwks)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn find_jwk<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|key| key.common.key_id.as_deref() == Some(kid))
}

fn decoding_key_for(jwk: &Jwk, alg: Algorithm) -> Result<DecodingKey, SsoError> {
    ensure_jwk_matches_algorithm(jwk, alg)?;
    DecodingKey::from_jwk(jwk).map_err(|e| SsoError::InvalidJwk(e.to_string()))
}

fn ensure_jwk_matches_algorithm(jwk: &Jwk, alg: Algorithm) -> Result<(), SsoError> {
    if let Some(key_alg) = &jwk.common.key_algorithm {
        if !key_algorithm_matches(key_alg, alg) {
            return Err(SsoError::InvalidJwk("alg mismatch".to_string()));
        }
    }

    match (&jwk.algorithm, alg) {
        (
            AlgorithmParameters::RSA(_),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512,
        ) => Ok(()),
        (AlgorithmParameters::EllipticCurve(params), Algorithm::ES256)
            if params.curve == EllipticCurve::P256 =>
        {
            Ok(())
        }
        (AlgorithmParameters::EllipticCurve(params), Algorithm::ES384)
            if params.curve == EllipticCurve::P384 =>
        {
            Ok(())
        }
        _ => Err(SsoError::InvalidJwk("kty mismatch".to_string())),
    }
}

fn key_algorithm_matches(key_alg: &KeyAlgorithm, alg: Algorithm) -> bool {
    matches!(
        (key_alg, alg),
        (KeyAlgorithm::RS256, Algorithm::RS256)
            | (KeyAlgorithm::RS384, Algorithm::RS384)
            | (KeyAlgorithm::RS512, Algorithm::RS512)
            | (KeyAlgorithm::PS256, Algorithm::PS256)
            | (KeyAlgorithm::PS384, Algorithm::PS384)
            | (KeyAlgorithm::PS512, Algorithm::PS512)
            | (KeyAlgorithm::ES256, Algorithm::ES256)
            | (KeyAlgorithm::ES384, Algorithm::ES384)
    )
}

fn string_claim(claims: &Value, name: &str) -> Option<String> {
    claims
        .get(name)
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    fn config() -> SsoConfig {
        SsoConfig {
            enabled: true,
            issuer: "https://idp.sekolah.id".to_string(),
            audience: "portal".to_string(),
            jwks_url: "http://127.0.0.1:9/jwks".to_string(),
            ..Default::default()
        }
    }

    fn hs_token(alg: Algorithm, kid: Option<&str>) -> String {
        let mut header = Header::new(alg);
        header.kid = kid.map(str::to_string);
        let now = chrono::Utc::now().timestamp();
        let claims = json!({ "iss": "https://idp.sekolah.id", "aud": "portal", "exp": now + 300 });
        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(b"not-a-provider-key")).unwrap()
    }

    #[test]
    fn test_unknown_algorithm_in_config() {
        let config = SsoConfig {
            algorithms: vec!["XX999".to_string()],
            ..config()
        };
        assert!(matches!(
            SsoVerifier::new(&config),
            Err(SsoError::UnsupportedAlgorithm(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_token() {
        let verifier = SsoVerifier::new(&config()).unwrap();
        assert!(matches!(verifier.verify("  ").await, Err(SsoError::MissingToken)));
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let verifier = SsoVerifier::new(&config()).unwrap();
        assert!(matches!(verifier.verify("not.a.jwt").await, Err(SsoError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_symmetric_tokens_rejected_before_fetch() {
        let verifier = SsoVerifier::new(&config()).unwrap();
        let err = verifier.verify(&hs_token(Algorithm::HS256, Some("k1"))).await.unwrap_err();

        assert!(matches!(err, SsoError::UnsupportedAlgorithm(_)));
        assert!(!verifier.has_cached_keys());
    }

    #[test]
    fn test_jwk_algorithm_checks() {
        let jwk: Jwk = serde_json::from_value(json!({
            "kty": "RSA", "kid": "k1", "alg": "RS256", "use": "sig",
            "n": "AQAB", "e": "AQAB"
        }))
        .unwrap();

        assert!(ensure_jwk_matches_algorithm(&jwk, Algorithm::RS256).is_ok());
        assert!(ensure_jwk_matches_algorithm(&jwk, Algorithm::RS512).is_err());
        assert!(ensure_jwk_matches_algorithm(&jwk, Algorithm::ES256).is_err());
    }

    #[test]
    fn test_find_jwk() {
        let jwks: JwkSet = serde_json::from_value(json!({
            "keys": [{ "kty": "RSA", "kid": "k1", "n": "AQAB", "e": "AQAB" }]
        }))
        .unwrap();

        assert!(find_jwk(&jwks, "k1").is_some());
        assert!(find_jwk(&jwks, "k2").is_none());
    }
}
