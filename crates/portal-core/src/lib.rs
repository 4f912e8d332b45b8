// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-core
//!
//! Identity-claim reconciliation for the school portal.
//!
//! A user account starts unlinked. It becomes a student or staff account
//! only by being linked to an authoritative master record, either through
//! an administrator-reviewed claim or through self-activation. This crate
//! holds the rules for that linkage:
//!
//! - **Role / Permission**: closed role set, total normalization, static grants
//! - **Model**: master records, user profiles, claim requests
//! - **Matching**: master lookup, academic-name cleaning, secondary-key checks
//! - **Policy**: reviewed-claim and direct-activation verification
//! - **Claims**: claim lifecycle with atomic approval
//! - **Accounts**: registration, login, self-activation, federated provisioning
//! - **Store / Identity**: storage and credential abstractions with in-memory backends
//! - **Audit**: audit trail primitives
//!
//! ## Example
//!
//! ```
//! use portal_core::permission::{has_permission, Permission};
//! use portal_core::role::{normalize_role, Role};
//!
//! let role = normalize_role("gtk", Role::Guest);
//! assert_eq!(role, Role::Teacher);
//! assert!(has_permission(role.code(), Permission::ScanQr));
//! assert!(!has_permission("not-a-real-role", Permission::ViewDashboard));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod model;
pub mod permission;
pub mod role;

// =============================================================================
// Persistence & Identity
// =============================================================================

pub mod identity;
pub mod store;

// =============================================================================
// Reconciliation
// =============================================================================

pub mod accounts;
pub mod claims;
pub mod matching;
pub mod policy;

// =============================================================================
// Audit
// =============================================================================

pub mod audit;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use model::{
    AccountStatus, AuthProvider, ClaimRequest, ClaimStatus, ClaimType, MasterRecord,
    StatusFilter, UserProfile,
};
pub use permission::{has_permission, permissions_for, permissions_of, Permission, PermissionSet};
pub use role::{hierarchy_of, normalize_role, normalize_role_opt, Role};

pub use accounts::{AccountService, Activation, ActivationRequest, FederatedLogin};
pub use claims::{ClaimService, ReviewView, SubmitClaim};
pub use matching::{clean_academic_name, verify_secondary_key, IdentityMatcher, MatchingRules};
pub use policy::{DirectActivationPolicy, ReviewedClaimPolicy, VerificationPolicy};

pub use identity::{IdentityError, IdentityProvider, IdentityResult, InMemoryIdentityProvider};
pub use store::{DocumentStore, InMemoryStore, Repository, StoreError, StoreResult};

pub use audit::{
    ActionResult, AuditAction, AuditError, AuditFilter, AuditLog, AuditLogger, AuditResource,
    AuditSeverity, InMemoryAuditLogger, NoOpAuditLogger, TeeAuditLogger, TracingAuditLogger,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
