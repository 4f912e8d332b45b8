// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Upstreams
//!
//! Local HTTP servers standing in for the identity provider's key set
//! endpoint and the generative AI upstream. Each binds `127.0.0.1:0` and
//! counts what it receives.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::fixtures::TEST_PRIVATE_KEY_PEM;

async fn spawn(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });
    (addr, handle)
}

// =============================================================================
// JWKS Server
// =============================================================================

#[derive(Clone)]
struct JwksState {
    jwks: Arc<RwLock<Value>>,
    hits: Arc<AtomicUsize>,
}

async fn serve_jwks(State(state): State<JwksState>) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Json(state.jwks.read().clone())
}

/// A key set endpoint whose content can be rotated mid-test.
pub struct MockJwksServer {
    addr: SocketAddr,
    state: JwksState,
    handle: JoinHandle<()>,
}

impl MockJwksServer {
    /// Starts serving `jwks` at `/jwks`.
    pub async fn start(jwks: Value) -> Self {
        let state = JwksState {
            jwks: Arc::new(RwLock::new(jwks)),
            hits: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/jwks", get(serve_jwks))
            .with_state(state.clone());
        let (addr, handle) = spawn(app).await;
        Self {
            addr,
            state,
            handle,
        }
    }

    /// Key set URL.
    pub fn url(&self) -> String {
        format!("http://{}/jwks", self.addr)
    }

    /// Replaces the served key set.
    pub fn rotate(&self, jwks: Value) {
        *self.state.jwks.write() = jwks;
    }

    /// Number of key set fetches served.
    pub fn fetch_count(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockJwksServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Signs `claims` with the test RSA key under `kid`.
pub fn mint_upstream_token(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    jsonwebtoken::encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY_PEM.as_bytes()).expect("key"),
    )
    .expect("token")
}

/// Standard provider claims valid for five minutes.
pub fn provider_claims(issuer: &str, audience: &str, email: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": issuer,
        "sub": format!("sub-{}", email),
        "aud": audience,
        "iat": now,
        "exp": now + 300,
        "email": email,
    })
}

// =============================================================================
// AI Upstream
// =============================================================================

/// A request captured by [`MockAiUpstream`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request path.
    pub path: String,
    /// Value of the upstream key header.
    pub api_key: Option<String>,
    /// Raw body.
    pub body: Bytes,
}

#[derive(Clone)]
struct AiState {
    status: StatusCode,
    response: Value,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn serve_ai(
    State(state): State<AiState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.requests.lock().push(RecordedRequest {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (state.status, Json(state.response.clone()))
}

/// An AI upstream answering every request with a fixed status and body.
pub struct MockAiUpstream {
    addr: SocketAddr,
    state: AiState,
    handle: JoinHandle<()>,
}

impl MockAiUpstream {
    /// Starts the upstream.
    pub async fn start(status: StatusCode, response: Value) -> Self {
        let state = AiState {
            status,
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new().fallback(serve_ai).with_state(state.clone());
        let (addr, handle) = spawn(app).await;
        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL to configure as the AI upstream.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }
}

impl Drop for MockAiUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
