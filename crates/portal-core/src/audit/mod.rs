// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit trail for identity and authorization events.
//!
//! Claim transitions, logins, activations, role changes, AI proxy calls and
//! client-submitted events are recorded through the [`AuditLogger`] trait.
//! Callers log and move on: an audit write failure is reported through
//! tracing and never changes the outcome of the audited operation
//! (see [`record`]).
//!
//! # Components
//!
//! - [`AuditLogger`]: logger trait
//! - [`InMemoryAuditLogger`]: bounded, queryable buffer
//! - [`TracingAuditLogger`]: one structured line per entry
//! - [`TeeAuditLogger`]: fan-out to two loggers

mod error;
mod memory_logger;
mod tracing_logger;
mod types;

pub use error::{AuditError, AuditResult};
pub use memory_logger::InMemoryAuditLogger;
pub use tracing_logger::{TeeAuditLogger, TracingAuditLogger};
pub use types::{ActionResult, AuditAction, AuditFilter, AuditLog, AuditResource, AuditSeverity};

use async_trait::async_trait;

// =============================================================================
// Core Trait
// =============================================================================

/// Trait for audit logger implementations.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Logs an audit entry.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Queries entries. Loggers without query support return
    /// [`AuditError::QueryNotSupported`].
    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>>;

    /// Flushes any buffered entries.
    async fn flush(&self) -> AuditResult<()>;

    /// Returns the logger name for identification.
    fn name(&self) -> &str {
        "audit_logger"
    }

    /// Returns `true` if this logger supports querying.
    fn supports_query(&self) -> bool {
        false
    }
}

/// Logs an entry, downgrading any failure to a warning.
pub async fn record(logger: &dyn AuditLogger, entry: AuditLog) {
    let action = entry.action;
    if let Err(e) = logger.log(entry).await {
        tracing::warn!(action = action.as_str(), error = %e, "Failed to write audit log");
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// A no-op audit logger that discards all entries.
#[derive(Debug, Default, Clone)]
pub struct NoOpAuditLogger;

impl NoOpAuditLogger {
    /// Creates a new no-op logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLogger;

    #[async_trait]
    impl AuditLogger for FailingLogger {
        async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
            Err(AuditError::write_failed("disk full"))
        }

        async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
            Ok(Vec::new())
        }

        async fn flush(&self) -> AuditResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_swallows_failures() {
        record(&FailingLogger, AuditLog::login("u1", None, true)).await;
    }

    #[tokio::test]
    async fn test_noop() {
        let logger = NoOpAuditLogger::new();
        logger.log(AuditLog::login("u1", None, true)).await.unwrap();
        assert!(logger.query(AuditFilter::new()).await.unwrap().is_empty());
    }
}
