// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Response and audit-trail assertions with informative failure messages.

use std::time::Duration;

use portal_core::{AuditAction, AuditLog, InMemoryAuditLogger};

use super::builders::TestResponse;

// =============================================================================
// Response Assertions
// =============================================================================

/// Asserts the response status.
pub fn assert_status(response: &TestResponse, expected: u16) {
    assert_eq!(
        response.status.as_u16(),
        expected,
        "Expected status {}, got {} with body {}",
        expected,
        response.status,
        response.body
    );
}

/// Asserts the status and the error code of an error body.
pub fn assert_error(response: &TestResponse, status: u16, code: &str) {
    assert_status(response, status);
    assert_eq!(
        response.error_code(),
        Some(code),
        "Expected error code {}, got body {}",
        code,
        response.body
    );
}

// =============================================================================
// Audit Assertions
// =============================================================================

/// Waits for an audit entry written by a spawned task.
///
/// Panics after one second without a matching entry.
pub async fn wait_for_audit(logger: &InMemoryAuditLogger, action: AuditAction) -> AuditLog {
    for _ in 0..100 {
        if let Some(entry) = logger.entries_for_action(action).into_iter().last() {
            return entry;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "No audit entry for {:?} within 1s; have {:?}",
        action,
        logger.entries().iter().map(|e| e.action).collect::<Vec<_>>()
    );
}
