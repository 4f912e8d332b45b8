// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Portal Integration Tests
//!
//! Integration tests for the school portal identity service, together with
//! the fixtures, builders and mock upstreams they share.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities, fixtures, and helpers
//!   - `fixtures`: Master records, configurations and signing keys
//!   - `builders`: [`TestApp`](common::TestApp) and its builder
//!   - `assertions`: Response and audit assertions
//!   - `mocks`: Local JWKS and AI upstream servers
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p portal-tests
//!
//! # Run specific test suite
//! cargo test -p portal-tests --test integration_core
//! cargo test -p portal-tests --test integration_config
//! cargo test -p portal-tests --test integration_api
//! cargo test -p portal-tests --test integration_sso
//!
//! # Run with verbose output
//! cargo test -p portal-tests -- --nocapture
//! ```
//!
//! ## Test Categories
//!
//! ### Core Tests (`integration_core.rs`)
//! - Role normalization and permission tables
//! - Academic name cleaning and secondary keys
//! - Claim lifecycle and concurrent approval
//! - Self-activation, compensation and reclaim
//!
//! ### Config Tests (`integration_config.rs`)
//! - Configuration parsing (YAML, TOML, JSON)
//! - Validation rules
//! - Environment variable placeholders
//!
//! ### API Tests (`integration_api.rs`)
//! - Session gate and permission checks
//! - Registration, login, activation and lookup
//! - Claim endpoints and admin review
//! - Rate limiting and the AI proxy
//!
//! ### SSO Tests (`integration_sso.rs`)
//! - Key set caching and refresh on unknown key ids
//! - Issuer and audience checks
//! - Federated profile provisioning
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use portal_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::builder().with_seed_records().build().await;
//!     let response = app.get("/api/lookup/siswa/0012345678", None).await;
//!     assert_status(&response, 200);
//! }
//! ```

pub mod common;

/// Commonly used test items.
pub mod prelude {
    pub use crate::common::*;
}
