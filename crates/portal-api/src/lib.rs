// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-api
//!
//! HTTP API for the school portal.
//!
//! - **Sessions**: HS256 bearer tokens whose role is re-normalised on every request
//! - **SSO**: provider ID tokens verified against a cached JWKS
//! - **Authorization gate**: auth, permission and rate-limit tower layers
//! - **Handlers**: registration, activation, lookup, claims, administration,
//!   AI proxy and client audit events
//!
//! ## Example
//!
//! ```rust,ignore
//! use portal_api::{ApiServer, AppState};
//!
//! let state = AppState::builder().config(config).build()?;
//! ApiServer::new(state).run_with_shutdown(shutdown).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod auth;
pub mod error;
pub mod extractors;
pub mod response;

// =============================================================================
// Server
// =============================================================================

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthContext, Claims, JwtManager, SsoError, SsoIdentity, SsoVerifier};
pub use error::{ApiError, ApiResult};
pub use middleware::{AuthLayer, RateLimitLayer, RateLimiter, RbacLayer};
pub use server::ApiServer;
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// =============================================================================
// Prelude
// =============================================================================

/// Convenience re-exports for common use cases.
pub mod prelude {
    pub use crate::auth::{AuthContext, JwtManager};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::ApiServer;
    pub use crate::state::AppState;
}

// =============================================================================
// Tests
// =============================================================================
