// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! [`TestApp`] wires a full router over in-memory backends and drives it
//! with `oneshot` requests, so no socket is bound for the portal itself.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use portal_api::{ApiServer, AppState, RateLimiter, SsoVerifier};
use portal_config::{Environment, PortalConfig, SecretValue};
use portal_core::{
    InMemoryAuditLogger, InMemoryIdentityProvider, InMemoryStore, Repository, Role, UserProfile,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

use super::fixtures::{ConfigFixtures, MasterFixtures, TEST_PASSWORD};

/// Peer address used when a test does not pick one.
pub const DEFAULT_PEER: ([u8; 4], u16) = ([127, 0, 0, 1], 40000);

// =============================================================================
// TestAppBuilder
// =============================================================================

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    config: PortalConfig,
    seed_records: bool,
    sso_verifier: Option<Arc<SsoVerifier>>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    /// Starts from the production fixture configuration.
    pub fn new() -> Self {
        Self {
            config: ConfigFixtures::production(),
            seed_records: false,
            sso_verifier: None,
        }
    }

    /// Switches to the development environment.
    pub fn development(mut self) -> Self {
        self.config.server.environment = Environment::Development;
        self
    }

    /// Applies an arbitrary configuration change.
    pub fn with_config(mut self, f: impl FnOnce(&mut PortalConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Sets the fixed-window limit.
    pub fn with_rate_limit(mut self, max_requests: u32, window_secs: u64) -> Self {
        self.config.security.rate_limit.enabled = true;
        self.config.security.rate_limit.max_requests = max_requests;
        self.config.security.rate_limit.window_secs = window_secs;
        self
    }

    /// Enables SSO against the given provider.
    pub fn with_sso(mut self, issuer: &str, audience: &str, jwks_url: &str) -> Self {
        self.config.sso.enabled = true;
        self.config.sso.issuer = issuer.to_string();
        self.config.sso.audience = audience.to_string();
        self.config.sso.jwks_url = jwks_url.to_string();
        self
    }

    /// Uses a prepared verifier so a test can inspect its cache.
    pub fn with_sso_verifier(mut self, verifier: Arc<SsoVerifier>) -> Self {
        self.sso_verifier = Some(verifier);
        self
    }

    /// Enables the AI proxy against the given upstream.
    pub fn with_ai(mut self, upstream_url: &str, api_key: &str) -> Self {
        self.config.ai.enabled = true;
        self.config.ai.upstream_url = upstream_url.to_string();
        self.config.ai.api_key = Some(SecretValue::new(api_key));
        self.config.ai.timeout_secs = 5;
        self
    }

    /// Writes the [`MasterFixtures`] records before the app is returned.
    pub fn with_seed_records(mut self) -> Self {
        self.seed_records = true;
        self
    }

    /// Builds the application.
    pub async fn build(self) -> TestApp {
        let store = InMemoryStore::new();
        let identity = InMemoryIdentityProvider::with_low_cost_hashing();
        let audit = InMemoryAuditLogger::new();
        let rate_limiter = Arc::new(RateLimiter::new(&self.config.security.rate_limit));

        let mut builder = AppState::builder()
            .config(self.config)
            .store(Arc::new(store.clone()))
            .identity_provider(Arc::new(identity.clone()))
            .audit_logger(Arc::new(audit.clone()))
            .rate_limiter(rate_limiter);
        if let Some(verifier) = self.sso_verifier {
            builder = builder.sso_verifier(verifier);
        }
        let state = builder.build().expect("Failed to build app state");

        let app = TestApp {
            router: ApiServer::new(state.clone()).router(),
            state,
            store,
            identity,
            audit,
        };

        if self.seed_records {
            let repo = app.repository();
            for (claim_type, record) in MasterFixtures::all() {
                repo.put_master(claim_type, &record)
                    .await
                    .expect("Failed to seed master record");
            }
        }

        app
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// A router over in-memory backends, plus handles to inspect them.
pub struct TestApp {
    /// Shared application state.
    pub state: AppState,
    /// The full router with middleware.
    pub router: Router,
    /// Backing store.
    pub store: InMemoryStore,
    /// Credential store.
    pub identity: InMemoryIdentityProvider,
    /// Captured audit trail.
    pub audit: InMemoryAuditLogger,
}

impl TestApp {
    /// Returns a builder.
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::new()
    }

    /// Repository over the app's store.
    pub fn repository(&self) -> Repository {
        self.state.accounts.repository().clone()
    }

    /// Issues a session token without touching the store.
    pub fn token_for(&self, uid: &str, role: Role) -> String {
        let profile = UserProfile::new(uid, format!("{}@sekolah.test", uid), uid).with_role(role);
        self.state
            .jwt()
            .issue_for(&profile)
            .expect("Failed to issue token")
    }

    /// Session token for an administrator.
    pub fn admin_token(&self) -> String {
        self.token_for("admin-test", Role::Admin)
    }

    /// Registers a password account and returns `(uid, token)`.
    pub async fn register(&self, email: &str, display_name: &str) -> (String, String) {
        let response = self
            .post(
                "/api/auth/register",
                None,
                serde_json::json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "display_name": display_name,
                }),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "registration failed: {}",
            response.body
        );
        (
            response.str_field("uid").to_string(),
            response.str_field("token").to_string(),
        )
    }

    /// Sends a request from the default peer.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.request_from(SocketAddr::from(DEFAULT_PEER), method, uri, token, body)
            .await
    }

    /// Sends a request from `peer`.
    pub async fn request_from(
        &self,
        peer: SocketAddr,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let mut request = builder.body(body).expect("Failed to build request");
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        TestResponse::read(response).await
    }

    /// GET helper.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    /// POST helper with a JSON body.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// POST helper without a body.
    pub async fn post_empty(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, token, None).await
    }

    /// PUT helper with a JSON body.
    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }
}

// =============================================================================
// TestResponse
// =============================================================================

/// A fully read response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body parsed as JSON; `Null` when empty, a string when not JSON.
    pub body: Value,
}

impl TestResponse {
    async fn read(response: axum::response::Response) -> Self {
        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns a top-level string field, panicking if absent.
    pub fn str_field(&self, name: &str) -> &str {
        self.body[name]
            .as_str()
            .unwrap_or_else(|| panic!("missing string field '{}' in {}", name, self.body))
    }

    /// Returns the error code of an error body.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }

    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.body.clone()).expect("Failed to deserialize body")
    }
}
