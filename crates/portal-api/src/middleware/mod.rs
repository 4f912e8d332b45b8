// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! Layer order on the API router, outermost first:
//!
//! - [`AuthLayer`]: session authentication on every route, attaches the
//!   [`AuthContext`](crate::auth::AuthContext)
//! - [`RbacLayer`]: per-route-group permission checks
//! - [`RateLimitLayer`]: fixed-window limit keyed by address and user

mod auth;
mod rate_limit;
mod rbac;

pub use auth::{AuthLayer, AuthMiddleware};
pub use rate_limit::{RateKey, RateLimitDecision, RateLimitLayer, RateLimitMiddleware, RateLimiter};
pub use rbac::{RbacLayer, RbacMiddleware};
