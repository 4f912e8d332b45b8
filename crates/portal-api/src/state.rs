// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use portal_config::PortalConfig;
use portal_core::{
    AccountService, AuditLogger, ClaimService, DocumentStore, IdentityMatcher, IdentityProvider,
    InMemoryAuditLogger, InMemoryIdentityProvider, InMemoryStore, MatchingRules, NoOpAuditLogger,
    Repository, TeeAuditLogger, TracingAuditLogger,
};

use crate::auth::{JwtManager, SsoVerifier};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RateLimiter;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Every process-scoped component (rate-limit counters, the provider key
/// set cache, the audit trail) is owned here and injected into handlers.
/// Nothing is held in globals, so each test can build a fresh state.
#[derive(Clone)]
pub struct AppState {
    /// Portal configuration.
    pub config: Arc<PortalConfig>,
    /// Session token manager.
    pub jwt_manager: Arc<JwtManager>,
    /// Account, activation and federated login service.
    pub accounts: Arc<AccountService>,
    /// Claim lifecycle service.
    pub claims: Arc<ClaimService>,
    /// Master record lookup.
    pub matcher: Arc<IdentityMatcher>,
    /// Backing document store.
    pub store: Arc<dyn DocumentStore>,
    /// Federated token verifier, present when SSO is enabled.
    pub sso: Option<Arc<SsoVerifier>>,
    /// Fixed-window rate limiter.
    pub rate_limiter: Arc<RateLimiter>,
    /// Audit logger.
    pub audit_logger: Arc<dyn AuditLogger>,
    /// Outbound HTTP client for the AI upstream.
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the session token manager.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt_manager
    }

    /// Returns the audit logger.
    pub fn audit(&self) -> &Arc<dyn AuditLogger> {
        &self.audit_logger
    }

    /// Returns `true` when running with production safeguards.
    pub fn is_production(&self) -> bool {
        self.config.server.environment.is_production()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
///
/// Unset components fall back to in-memory implementations.
pub struct AppStateBuilder {
    config: Option<PortalConfig>,
    store: Option<Arc<dyn DocumentStore>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    audit_logger: Option<Arc<dyn AuditLogger>>,
    rate_limiter: Option<Arc<RateLimiter>>,
    sso: Option<Arc<SsoVerifier>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            identity: None,
            audit_logger: None,
            rate_limiter: None,
            sso: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: PortalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the document store.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the identity provider.
    pub fn identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Sets the rate limiter.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Sets the SSO verifier, overriding the one built from configuration.
    pub fn sso_verifier(mut self, verifier: Arc<SsoVerifier>) -> Self {
        self.sso = Some(verifier);
        self
    }

    /// Builds the AppState.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();
        let jwt_manager = Arc::new(JwtManager::new(&config.security.jwt)?);

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let identity = self
            .identity
            .unwrap_or_else(|| Arc::new(InMemoryIdentityProvider::new()));

        let repo = Repository::new(store.clone());
        let matcher = IdentityMatcher::new(repo.clone()).with_rules(MatchingRules {
            student_min_length: config.matching.student_min_length,
            staff_min_length: config.matching.staff_min_length,
        });

        let accounts = AccountService::new(repo.clone(), matcher.clone(), identity);
        let claims = ClaimService::new(repo, matcher.clone());

        let sso = match self.sso {
            Some(verifier) => Some(verifier),
            None if config.sso.enabled => Some(Arc::new(
                SsoVerifier::new(&config.sso)
                    .map_err(|e| ApiError::internal(format!("SSO setup failed: {}", e)))?,
            )),
            None => None,
        };

        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::new(&config.security.rate_limit)));

        let audit_logger = self
            .audit_logger
            .unwrap_or_else(|| default_audit_logger(&config));

        let http_client = reqwest::Client::builder()
            .timeout(config.ai.timeout())
            .build()
            .map_err(|e| ApiError::internal(format!("HTTP client setup failed: {}", e)))?;

        Ok(AppState {
            config: Arc::new(config),
            jwt_manager,
            accounts: Arc::new(accounts),
            claims: Arc::new(claims),
            matcher: Arc::new(matcher),
            store,
            sso,
            rate_limiter,
            audit_logger,
            http_client,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_audit_logger(config: &PortalConfig) -> Arc<dyn AuditLogger> {
    if !config.security.audit.enabled {
        return Arc::new(NoOpAuditLogger::new());
    }
    Arc::new(TeeAuditLogger::new(
        Arc::new(InMemoryAuditLogger::with_capacity(config.security.audit.max_entries)),
        Arc::new(TracingAuditLogger::new()),
    ))
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_manager.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<PortalConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use portal_config::{Environment, SecretValue, SsoConfig};

    fn test_config() -> PortalConfig {
        let mut config = PortalConfig::default();
        config.security.jwt.secret = Some(SecretValue::new(
            "test-secret-key-that-is-long-enough-for-testing",
        ));
        config
    }

    #[test]
    fn test_app_state_builder() {
        let state = AppState::builder().config(test_config()).build().unwrap();

        assert!(state.sso.is_none());
        assert!(state.is_production());
        assert_eq!(state.audit().name(), "tee");
    }

    #[test]
    fn test_missing_secret_fails() {
        assert!(AppState::builder().build().is_err());
    }

    #[test]
    fn test_sso_built_from_config() {
        let mut config = test_config();
        config.server.environment = Environment::Development;
        config.sso = SsoConfig {
            enabled: true,
            issuer: "https://idp.sekolah.id".to_string(),
            audience: "portal".to_string(),
            jwks_url: "https://idp.sekolah.id/jwks".to_string(),
            ..Default::default()
        };

        let state = AppState::builder().config(config).build().unwrap();
        assert!(state.sso.is_some());
        assert!(!state.is_production());
    }

    #[test]
    fn test_audit_disabled() {
        let mut config = test_config();
        config.security.audit.enabled = false;

        let state = AppState::builder().config(config).build().unwrap();
        assert_eq!(state.audit().name(), "noop");
    }
}
