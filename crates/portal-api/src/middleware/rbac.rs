// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission enforcement middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use portal_core::Permission;
use tower::{Layer, Service};

use crate::auth::AuthContext;
use crate::error::ApiError;

// =============================================================================
// RbacLayer
// =============================================================================

/// Layer that rejects requests whose resolved permissions are insufficient.
///
/// Runs after [`AuthLayer`](super::AuthLayer). A missing context is an
/// authentication failure (401); an authenticated caller without the
/// permission is an authorization failure (403).
#[derive(Clone)]
pub struct RbacLayer {
    required_permissions: Arc<Vec<Permission>>,
    require_all: bool,
}

impl RbacLayer {
    /// Creates a layer requiring a single permission.
    pub fn require(permission: Permission) -> Self {
        Self {
            required_permissions: Arc::new(vec![permission]),
            require_all: true,
        }
    }

    /// Creates a layer requiring all specified permissions.
    pub fn require_all(permissions: Vec<Permission>) -> Self {
        Self {
            required_permissions: Arc::new(permissions),
            require_all: true,
        }
    }

    /// Creates a layer requiring any of the specified permissions.
    pub fn require_any(permissions: Vec<Permission>) -> Self {
        Self {
            required_permissions: Arc::new(permissions),
            require_all: false,
        }
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacMiddleware {
            inner,
            required_permissions: self.required_permissions.clone(),
            require_all: self.require_all,
        }
    }
}

// =============================================================================
// RbacMiddleware
// =============================================================================

/// Middleware for permission enforcement.
#[derive(Clone)]
pub struct RbacMiddleware<S> {
    inner: S,
    required_permissions: Arc<Vec<Permission>>,
    require_all: bool,
}

impl<S> Service<Request<Body>> for RbacMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let required = self.required_permissions.clone();
        let require_all = self.require_all;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let auth_ctx = req
                .extensions()
                .get::<AuthContext>()
                .filter(|ctx| !ctx.is_anonymous())
                .cloned();

            match auth_ctx {
                Some(ctx) => {
                    let allowed = if require_all {
                        ctx.has_all_permissions(&required)
                    } else {
                        ctx.has_any_permission(&required)
                    };

                    if allowed {
                        inner.call(req).await
                    } else {
                        tracing::warn!(
                            user_id = %ctx.user_id,
                            role = %ctx.role,
                            required_permissions = ?required.as_slice(),
                            path = %req.uri().path(),
                            "Permission denied"
                        );
                        Ok(ApiError::forbidden("Insufficient permissions").into_response())
                    }
                }
                None => {
                    tracing::debug!(path = %req.uri().path(), "No authenticated context, denying access");
                    Ok(ApiError::unauthorized("Authentication required").into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
