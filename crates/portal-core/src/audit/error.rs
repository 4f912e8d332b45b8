// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit error types.

use thiserror::Error;

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Audit sink failures. Callers log these and carry on; an audit failure
/// never fails the audited operation.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink rejected the entry.
    #[error("Audit write rejected: {reason}")]
    WriteFailed {
        /// Why the sink rejected it.
        reason: String,
    },

    /// The sink is write-only.
    #[error("Audit sink '{sink}' cannot be queried")]
    QueryNotSupported {
        /// Sink name.
        sink: String,
    },

    /// Entry details could not be encoded.
    #[error("Audit details not encodable: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl AuditError {
    /// Creates a write failure.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }

    /// Creates an error for a write-only sink.
    pub fn query_not_supported(sink: impl Into<String>) -> Self {
        Self::QueryNotSupported { sink: sink.into() }
    }
}
