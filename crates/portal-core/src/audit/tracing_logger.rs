// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logger that emits one structured tracing event per entry.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{AuditError, AuditResult};
use super::types::{AuditFilter, AuditLog, AuditSeverity};
use super::AuditLogger;

/// Writes entries to the `audit` tracing target.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    /// Creates a new tracing logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let details = serde_json::to_string(&entry.details)?;
        let user = entry.user_id.as_deref().unwrap_or("anonymous");
        let ip = entry.client_ip.map(|ip| ip.to_string()).unwrap_or_default();
        let request_id = entry.request_id.as_deref().unwrap_or("");

        match entry.severity {
            AuditSeverity::Info => tracing::info!(
                target: "audit",
                audit_id = %entry.id,
                action = entry.action.as_str(),
                resource = %entry.resource.full_path(),
                result = entry.result.as_str(),
                user,
                ip = %ip,
                request_id,
                details = %details,
                "audit"
            ),
            AuditSeverity::Warning | AuditSeverity::Critical => tracing::warn!(
                target: "audit",
                audit_id = %entry.id,
                severity = entry.severity.as_str(),
                action = entry.action.as_str(),
                resource = %entry.resource.full_path(),
                result = entry.result.as_str(),
                user,
                ip = %ip,
                request_id,
                details = %details,
                "audit"
            ),
        }
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::query_not_supported("tracing"))
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

// =============================================================================
// Tee
// =============================================================================

/// Sends every entry to a primary and a secondary logger.
///
/// Queries go to the primary. A secondary write failure is reported through
/// tracing and does not fail the call.
#[derive(Clone)]
pub struct TeeAuditLogger {
    primary: Arc<dyn AuditLogger>,
    secondary: Arc<dyn AuditLogger>,
}

impl TeeAuditLogger {
    /// Creates a tee.
    pub fn new(primary: Arc<dyn AuditLogger>, secondary: Arc<dyn AuditLogger>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl AuditLogger for TeeAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        if let Err(e) = self.secondary.log(entry.clone()).await {
            tracing::warn!(logger = self.secondary.name(), error = %e, "Secondary audit write failed");
        }
        self.primary.log(entry).await
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        self.primary.query(filter).await
    }

    async fn flush(&self) -> AuditResult<()> {
        self.secondary.flush().await?;
        self.primary.flush().await
    }

    fn name(&self) -> &str {
        "tee"
    }

    fn supports_query(&self) -> bool {
        self.primary.supports_query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditLogger;

    #[tokio::test]
    async fn test_tracing_logger_accepts_entries() {
        let logger = TracingAuditLogger::new();
        logger.log(AuditLog::login("u1", None, false)).await.unwrap();
        assert!(logger.query(AuditFilter::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_tee_queries_primary() {
        let memory = InMemoryAuditLogger::new();
        let tee = TeeAuditLogger::new(Arc::new(memory.clone()), Arc::new(TracingAuditLogger::new()));
        tee.log(AuditLog::login("u1", None, true)).await.unwrap();

        assert_eq!(memory.len(), 1);
        assert!(tee.supports_query());
        assert_eq!(tee.query(AuditFilter::new()).await.unwrap().len(), 1);
    }
}
