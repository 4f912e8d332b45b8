// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for the portal core.
//!
//! # Error Hierarchy
//!
//! ```text
//! CoreError (root)
//! ├── Validation      - bad input shape, length or format
//! ├── NotFound        - absent or already-claimed master record ("no match")
//! ├── Conflict        - duplicate active claim, lost approval race
//! ├── Authentication  - invalid credentials or token
//! ├── Authorization   - valid identity, insufficient permission
//! ├── Store           - document store failures
//! ├── Identity        - identity provider failures
//! └── Internal        - invariant violations
//! ```
//!
//! # Examples
//!
//! ```
//! use portal_core::error::CoreError;
//! use portal_core::store::StoreError;
//!
//! let err: CoreError = StoreError::unavailable("timeout").into();
//! assert!(err.is_retryable());
//! assert_eq!(err.status_code(), 503);
//! ```

use thiserror::Error;

use crate::identity::IdentityError;
use crate::store::StoreError;

// =============================================================================
// CoreError
// =============================================================================

/// The root error type for portal-core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// Offending field.
        field: String,
        /// Error message.
        message: String,
    },

    /// Resource not found.
    ///
    /// Master-record lookups deliberately use the same message for absent and
    /// already-claimed records.
    #[error("{resource} not found")]
    NotFound {
        /// Resource description.
        resource: String,
    },

    /// State conflict.
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message.
        message: String,
    },

    /// Caller lacks the required permission.
    #[error("Not authorized: {message}")]
    Authorization {
        /// Error message.
        message: String,
    },

    /// Document store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Identity provider error.
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Internal invariant violated.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// The single "no match" error used for master-record lookups.
    pub fn no_match() -> Self {
        Self::not_found("Matching record")
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if re-invoking the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Store(e) => e.is_retryable(),
            CoreError::Identity(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            CoreError::Validation { .. } => "validation",
            CoreError::NotFound { .. } => "not_found",
            CoreError::Conflict { .. } => "conflict",
            CoreError::Authentication { .. } => "authentication",
            CoreError::Authorization { .. } => "authorization",
            CoreError::Store(_) => "store",
            CoreError::Identity(_) => "identity",
            CoreError::Internal { .. } => "internal",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Validation { .. } => 400,
            CoreError::NotFound { .. } => 404,
            CoreError::Conflict { .. } => 409,
            CoreError::Authentication { .. } => 401,
            CoreError::Authorization { .. } => 403,
            CoreError::Store(e) => e.status_code(),
            CoreError::Identity(e) => e.status_code(),
            CoreError::Internal { .. } => 500,
        }
    }
}

/// A Result type with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Tests
// =============================================================================
