// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post, put},
    Router,
};
use portal_config::{CorsConfig, PortalConfig};
use portal_core::Permission;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, RateLimitLayer, RbacLayer};
use crate::state::AppState;

/// Endpoints reachable without a session outside production.
const DEVELOPMENT_OPTIONAL_PATHS: [&str; 2] = ["/api/gemini", "/api/audit"];

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<PortalConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Returns the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates the router with all routes and middleware.
    ///
    /// Layer order, outermost first: trace, compression, timeout, CORS,
    /// body limit, session auth. Route groups add their own permission
    /// checks, and the AI proxy adds the rate limiter.
    pub fn router(&self) -> Router {
        let production = self.config.server.environment.is_production();

        let mut auth = AuthLayer::new(self.state.jwt_manager.clone()).with_default_public_paths();
        if !production {
            auth = auth.with_optional_paths(DEVELOPMENT_OPTIONAL_PATHS);
        }

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.server.request_timeout(),
            ))
            .layer(create_cors_layer(&self.config.server.cors))
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(auth);

        let admin = Router::new()
            .route("/api/admin/claims", get(handlers::list_claims))
            .route("/api/admin/claims/{id}/review", post(handlers::review_claim))
            .route("/api/admin/claims/{id}/approve", post(handlers::approve_claim))
            .route("/api/admin/claims/{id}/reject", post(handlers::reject_claim))
            .route("/api/admin/users/{uid}/role", put(handlers::assign_role))
            .route_layer(RbacLayer::require(Permission::ManageUsers));

        let mut ai = Router::new()
            .route("/api/gemini", post(handlers::ai_proxy))
            .route_layer(RateLimitLayer::new(self.state.rate_limiter.clone()));
        if production {
            ai = ai.route_layer(RbacLayer::require(Permission::AccessAi));
        }

        Router::new()
            // Health endpoints (public)
            .route("/health", get(handlers::health))
            .route("/ready", get(handlers::ready))
            // Auth endpoints
            .route("/api/auth/register", post(handlers::register))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/activate", post(handlers::activate))
            .route("/api/auth/login-sso", post(handlers::login_sso))
            .route("/api/auth/me", get(handlers::current_user))
            // Lookup (public)
            .route("/api/lookup/{type}/{id}", get(handlers::lookup))
            // Claims
            .route("/api/claims", post(handlers::submit_claim))
            .route("/api/claims/me", get(handlers::my_claims))
            // Audit
            .route("/api/audit", post(handlers::record_event))
            .merge(admin)
            .merge(ai)
            // Apply middleware and state
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server until the process is stopped.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener with graceful shutdown.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();
        let local = listener
            .local_addr()
            .map_err(|e| ApiError::internal(format!("Listener has no address: {}", e)))?;

        info!(
            addr = %local,
            environment = self.config.server.environment.as_str(),
            "Starting API server"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.server.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
///
/// Credentials are only allowed together with an explicit origin list.
fn create_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new().max_age(Duration::from_secs(cors.max_age_secs));

    let any_origin = cors.allows_any_origin();
    if any_origin {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    let any_header = cors.allowed_headers.iter().any(|h| h == "*");
    if any_header && !cors.allow_credentials {
        layer = layer.allow_headers(Any);
    } else {
        layer = layer.allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]);
    }

    if cors.allow_credentials && !any_origin {
        layer = layer.allow_credentials(true);
    }

    layer
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use portal_config::{Environment, SecretValue};
    use tower::ServiceExt;

    fn test_config() -> PortalConfig {
        let mut config = PortalConfig::default();
        config.security.jwt.secret = Some(SecretValue::new(
            "test-secret-key-that-is-long-enough-for-testing",
        ));
        config
    }

    fn server(config: PortalConfig) -> ApiServer {
        ApiServer::new(AppState::builder().config(config).build().unwrap())
    }

    fn connected(req: Request<Body>) -> Request<Body> {
        let mut req = req;
        req.extensions_mut()
            .insert(axum::extract::ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        req
    }

    #[test]
    fn test_server_addr() {
        assert_eq!(server(test_config()).addr().port(), 8080);
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = server(test_config())
            .router()
            .oneshot(connected(Request::builder().uri("/health").body(Body::empty()).unwrap()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_audit_requires_session_in_production() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/audit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"action":"open","target":"page","success":true}"#))
            .unwrap();

        let response = server(test_config())
            .router()
            .oneshot(connected(request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_audit_anonymous_in_development() {
        let mut config = test_config();
        config.server.environment = Environment::Development;

        let request = Request::builder()
            .method("POST")
            .uri("/api/audit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"action":"open","target":"page","success":true}"#))
            .unwrap();

        let response = server(config).router().oneshot(connected(request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_cors_layer_with_credentials() {
        let cors = CorsConfig {
            allowed_origins: vec!["https://portal.sekolah.id".to_string()],
            allow_credentials: true,
            ..Default::default()
        };
        let _layer = create_cors_layer(&cors);
    }
}
