// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Document store abstraction.
//!
//! The portal persists JSON documents in four collections. Backends expose
//! collection-scoped filtered reads, single-document writes with merge
//! semantics, and an atomic [`WriteBatch`] whose [`Precondition`]s are
//! evaluated in the same critical section as its writes. Claim approval
//! relies on that to close the check-then-write race on a master record.
//!
//! - [`DocumentStore`]: backend trait
//! - [`InMemoryStore`]: process-local backend with fault injection
//! - [`Repository`]: typed access on top of any backend

mod memory;
mod repository;

pub use memory::InMemoryStore;
pub use repository::{fields, from_document, to_document, Repository};

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

// =============================================================================
// Collections and Documents
// =============================================================================

/// A JSON object stored under a document id.
pub type Document = Map<String, Value>;

/// The persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// User profiles keyed by uid.
    Users,
    /// Student master records keyed by NISN.
    Students,
    /// Staff master records keyed by NIP.
    Teachers,
    /// Claim requests keyed by claim id.
    ClaimRequests,
}

impl Collection {
    /// Returns the collection name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Students => "students",
            Collection::Teachers => "teachers",
            Collection::ClaimRequests => "claim_requests",
        }
    }

    /// Returns all collections.
    pub fn all() -> &'static [Collection] {
        &[
            Collection::Users,
            Collection::Students,
            Collection::Teachers,
            Collection::ClaimRequests,
        ]
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Filters
// =============================================================================

/// A single filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals value.
    Eq(String, Value),
    /// Field equals one of the values.
    In(String, Vec<Value>),
}

impl Clause {
    /// Returns `true` if the document satisfies this clause.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Clause::Eq(field, value) => doc.get(field) == Some(value),
            Clause::In(field, values) => doc.get(field).is_some_and(|v| values.contains(v)),
        }
    }
}

/// AND-combined filter clauses. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality clause.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.into(), value.into()));
        self
    }

    /// Adds a membership clause.
    pub fn any_of<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.clauses.push(Clause::In(
            field.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Returns `true` if the document satisfies every clause.
    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|c| c.matches(doc))
    }
}

// =============================================================================
// Writes
// =============================================================================

/// How a write combines with an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document.
    Replace,
    /// Overwrite only the given top-level fields.
    Merge,
}

/// One write inside a batch.
#[derive(Debug, Clone)]
pub struct WriteOp {
    /// Target collection.
    pub collection: Collection,
    /// Target document id.
    pub id: String,
    /// Document body or partial fields.
    pub document: Document,
    /// Replace or merge.
    pub mode: WriteMode,
}

/// A condition checked atomically with the batch's writes.
#[derive(Debug, Clone)]
pub enum Precondition {
    /// The document exists and `field == value`.
    ///
    /// A missing field compares as JSON `null`.
    FieldEquals {
        /// Collection.
        collection: Collection,
        /// Document id.
        id: String,
        /// Field name.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// The document exists and `field` is one of `values`.
    FieldIn {
        /// Collection.
        collection: Collection,
        /// Document id.
        id: String,
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// No document in the collection matches the filter.
    NoneMatching {
        /// Collection.
        collection: Collection,
        /// Filter that must match nothing.
        filter: Filter,
    },
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::FieldEquals {
                collection,
                id,
                field,
                value,
            } => write!(f, "{collection}/{id}.{field} == {value}"),
            Precondition::FieldIn {
                collection,
                id,
                field,
                values,
            } => write!(f, "{collection}/{id}.{field} in {values:?}"),
            Precondition::NoneMatching { collection, .. } => {
                write!(f, "no matching document in {collection}")
            }
        }
    }
}

/// An all-or-nothing group of writes.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    preconditions: Vec<Precondition>,
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a precondition.
    pub fn require(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Adds a replacing write.
    pub fn set(mut self, collection: Collection, id: impl Into<String>, document: Document) -> Self {
        self.ops.push(WriteOp {
            collection,
            id: id.into(),
            document,
            mode: WriteMode::Replace,
        });
        self
    }

    /// Adds a merging write.
    pub fn merge(mut self, collection: Collection, id: impl Into<String>, fields: Document) -> Self {
        self.ops.push(WriteOp {
            collection,
            id: id.into(),
            document: fields,
            mode: WriteMode::Merge,
        });
        self
    }

    /// Returns the preconditions.
    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    /// Returns the writes in order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Returns the number of writes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if the batch has no writes.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Document store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document missing.
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection.
        collection: String,
        /// Document id.
        id: String,
    },

    /// A batch precondition did not hold. Nothing was written.
    #[error("Precondition failed: {message}")]
    PreconditionFailed {
        /// Which condition failed.
        message: String,
    },

    /// Security rules denied the operation.
    #[error("Permission denied on {collection}")]
    PermissionDenied {
        /// Collection.
        collection: String,
    },

    /// The commit was interrupted before it became visible.
    #[error("Commit interrupted: {message}")]
    Interrupted {
        /// Error message.
        message: String,
    },

    /// Backend unreachable or timed out.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// Document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.as_str().to_string(),
            id: id.into(),
        }
    }

    /// Creates a precondition failure.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }

    /// Creates a permission denied error.
    pub fn permission_denied(collection: Collection) -> Self {
        Self::PermissionDenied {
            collection: collection.as_str().to_string(),
        }
    }

    /// Creates an interrupted-commit error.
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` for transient failures.
    ///
    /// An interrupted commit is not retryable by the store: its outcome is
    /// reported as not applied, and the caller decides whether to re-invoke.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }

    /// Returns `true` if security rules denied the operation.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied { .. })
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } => 404,
            StoreError::PreconditionFailed { .. } => 409,
            StoreError::PermissionDenied { .. } => 403,
            StoreError::Interrupted { .. } | StoreError::Unavailable { .. } => 503,
            StoreError::Serialization(_) => 500,
        }
    }
}

/// A Result type with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// DocumentStore
// =============================================================================

/// Backend trait for the document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document.
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Reads every document matching the filter, as `(id, document)` pairs.
    async fn query(&self, collection: Collection, filter: &Filter)
        -> StoreResult<Vec<(String, Document)>>;

    /// Writes one document.
    async fn set(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
        mode: WriteMode,
    ) -> StoreResult<()>;

    /// Applies a batch atomically.
    ///
    /// Either every precondition holds and every write becomes visible, or
    /// an error is returned and nothing is written.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Returns the backend name.
    fn name(&self) -> &str {
        "document_store"
    }

    /// Returns `true` if the backend is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_filter_matches() {
        let d = doc(json!({"user_id": "u1", "status": "pending"}));

        assert!(Filter::new().matches(&d));
        assert!(Filter::new().eq("user_id", "u1").matches(&d));
        assert!(!Filter::new().eq("user_id", "u2").matches(&d));
        assert!(Filter::new()
            .eq("user_id", "u1")
            .any_of("status", ["pending", "reviewing"])
            .matches(&d));
        assert!(!Filter::new().any_of("status", ["approved"]).matches(&d));
        assert!(!Filter::new().eq("missing", "x").matches(&d));
    }

    #[test]
    fn test_batch_builder() {
        let batch = WriteBatch::new()
            .require(Precondition::FieldEquals {
                collection: Collection::Students,
                id: "1".into(),
                field: "claimed".into(),
                value: json!(false),
            })
            .set(Collection::ClaimRequests, "c1", doc(json!({"status": "approved"})))
            .merge(Collection::Students, "1", doc(json!({"claimed": true})));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.preconditions().len(), 1);
        assert_eq!(batch.ops()[1].mode, WriteMode::Merge);
    }

    #[test]
    fn test_store_error_classification() {
        assert!(StoreError::unavailable("down").is_retryable());
        assert!(!StoreError::interrupted("fault").is_retryable());
        assert!(StoreError::permission_denied(Collection::Users).is_permission_denied());
        assert_eq!(StoreError::precondition_failed("x").status_code(), 409);
    }

    #[test]
    fn test_collection_names() {
        let names: Vec<_> = Collection::all().iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["users", "students", "teachers", "claim_requests"]);
    }
}
