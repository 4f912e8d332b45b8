// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session authentication middleware.

use std::collections::HashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::auth::{AuthContext, JwtManager};
use crate::error::ApiError;

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for session authentication.
///
/// Every request leaves this layer with an [`AuthContext`] in its
/// extensions. Paths are treated in one of three ways:
///
/// - **public**: never authenticated, always anonymous
/// - **optional**: a valid token is honoured, no token means anonymous
/// - everything else: a valid bearer token is required
///
/// Permissions are recomputed from the token's role on every request.
#[derive(Clone)]
pub struct AuthLayer {
    jwt_manager: Arc<JwtManager>,
    public_paths: Arc<HashSet<String>>,
    optional_paths: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(jwt_manager: Arc<JwtManager>) -> Self {
        Self {
            jwt_manager,
            public_paths: Arc::new(HashSet::new()),
            optional_paths: Arc::new(HashSet::new()),
        }
    }

    /// Sets paths that don't require authentication.
    ///
    /// A trailing `*` matches any suffix.
    pub fn with_public_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.public_paths = Arc::new(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Sets paths where authentication is accepted but not required.
    pub fn with_optional_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.optional_paths = Arc::new(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Uses the portal's public endpoints.
    pub fn with_default_public_paths(self) -> Self {
        self.with_public_paths([
            "/health",
            "/ready",
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/activate",
            "/api/auth/login-sso",
            "/api/lookup/*",
        ])
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt_manager: self.jwt_manager.clone(),
            public_paths: self.public_paths.clone(),
            optional_paths: self.optional_paths.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for session authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt_manager: Arc<JwtManager>,
    public_paths: Arc<HashSet<String>>,
    optional_paths: Arc<HashSet<String>>,
}

impl<S> AuthMiddleware<S> {
    fn is_public_path(&self, path: &str) -> bool {
        path_matches(&self.public_paths, path)
    }

    fn is_optional_path(&self, path: &str) -> bool {
        path_matches(&self.optional_paths, path)
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let jwt_manager = self.jwt_manager.clone();
        let path = req.uri().path().to_string();
        let is_public = self.is_public_path(&path);
        let is_optional = self.is_optional_path(&path);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let request_id = Uuid::now_v7();
            let client_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());

            let token = extract_bearer_token(&req);

            let auth_ctx = match token {
                Some(token) if !is_public => match jwt_manager.validate_token(&token) {
                    Ok(token_data) => AuthContext::from_claims(&token_data.claims),
                    Err(e) => {
                        tracing::debug!(error = %e, path = %path, "Token validation failed");
                        return Ok(e.into_response());
                    }
                },
                _ if is_public || is_optional => AuthContext::anonymous(),
                _ => {
                    tracing::debug!(path = %path, "No authorization token provided");
                    return Ok(
                        ApiError::unauthorized("No authorization token provided").into_response()
                    );
                }
            };

            let mut auth_ctx = auth_ctx.with_request_id(request_id);
            if let Some(ip) = client_ip {
                auth_ctx = auth_ctx.with_client_ip(ip);
            }

            req.extensions_mut().insert(auth_ctx);
            inner.call(req).await
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn path_matches(paths: &HashSet<String>, path: &str) -> bool {
    if paths.contains(path) {
        return true;
    }

    paths.iter().any(|candidate| {
        candidate
            .strip_suffix('*')
            .is_some_and(|prefix| path.starts_with(prefix))
    })
}

/// Extracts the bearer token from the Authorization header.
pub(crate) fn extract_bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================
