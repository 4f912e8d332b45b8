// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory audit logger.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::AuditResult;
use super::types::{AuditAction, AuditFilter, AuditLog};
use super::AuditLogger;

/// Bounded in-memory audit logger.
///
/// Keeps the most recent `max_entries` entries (0 = unlimited) and supports
/// querying. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct InMemoryAuditLogger {
    logs: Arc<RwLock<VecDeque<AuditLog>>>,
    max_entries: usize,
}

impl Default for InMemoryAuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditLogger {
    /// Creates a logger with unlimited capacity.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a logger that drops the oldest entries beyond `max_entries`.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            logs: Arc::new(RwLock::new(VecDeque::with_capacity(max_entries.min(10_000)))),
            max_entries,
        }
    }

    /// Returns all entries, oldest first.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.logs.read().iter().cloned().collect()
    }

    /// Returns entries for one action.
    pub fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLog> {
        self.logs
            .read()
            .iter()
            .filter(|l| l.action == action)
            .cloned()
            .collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    /// Returns `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.logs.write().clear();
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let mut logs = self.logs.write();
        if self.max_entries > 0 && logs.len() >= self.max_entries {
            logs.pop_front();
        }
        logs.push_back(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let logs = self.logs.read();
        let mut results: Vec<AuditLog> = logs.iter().filter(|l| filter.matches(l)).cloned().collect();

        if filter.descending {
            results.reverse();
        }
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn supports_query(&self) -> bool {
        true
    }
}
