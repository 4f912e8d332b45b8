// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Internal session token issuance and validation
//! - Federated ID token verification against a cached key set
//! - The per-request authentication context

mod claims;
mod context;
mod jwt;
mod sso;

pub use claims::Claims;
pub use context::{AuthContext, ANONYMOUS_USER};
pub use jwt::JwtManager;
pub use sso::{SsoError, SsoIdentity, SsoVerifier};
