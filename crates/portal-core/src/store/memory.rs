// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory document store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    Collection, Document, DocumentStore, Filter, Precondition, StoreError, StoreResult,
    WriteBatch, WriteMode,
};

type Table = HashMap<String, Document>;

/// Process-local [`DocumentStore`].
///
/// All collections sit behind one lock so a [`WriteBatch`] can check its
/// preconditions and apply its writes without interleaving. Clones share
/// state.
///
/// Fault injection hooks are provided for exercising failure paths:
///
/// ```
/// use portal_core::store::{Collection, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.fail_next_commit();
/// store.deny_reads(Collection::ClaimRequests);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<Collection, Table>>>,
    faults: Arc<Faults>,
}

#[derive(Default)]
struct Faults {
    fail_next_commit: AtomicBool,
    unavailable: AtomicBool,
    denied_reads: Mutex<HashSet<Collection>>,
    commits: AtomicU64,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next [`DocumentStore::commit`] fail with
    /// [`StoreError::Interrupted`] without publishing any write.
    pub fn fail_next_commit(&self) {
        self.faults.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Makes every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes reads on `collection` fail with [`StoreError::PermissionDenied`].
    pub fn deny_reads(&self, collection: Collection) {
        self.faults.denied_reads.lock().insert(collection);
    }

    /// Clears all read denials.
    pub fn allow_reads(&self) {
        self.faults.denied_reads.lock().clear();
    }

    /// Returns the number of successfully applied batches.
    pub fn commit_count(&self) -> u64 {
        self.faults.commits.load(Ordering::SeqCst)
    }

    /// Returns the number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .await
            .get(&collection)
            .map_or(0, HashMap::len)
    }

    /// Returns `true` if every collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.values().all(HashMap::is_empty)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store marked unavailable"));
        }
        Ok(())
    }

    fn check_readable(&self, collection: Collection) -> StoreResult<()> {
        self.check_available()?;
        if self.faults.denied_reads.lock().contains(&collection) {
            return Err(StoreError::permission_denied(collection));
        }
        Ok(())
    }
}

fn apply(table: &mut Table, id: &str, document: Document, mode: WriteMode) {
    match mode {
        WriteMode::Replace => {
            table.insert(id.to_string(), document);
        }
        WriteMode::Merge => {
            let existing = table.entry(id.to_string()).or_default();
            for (key, value) in document {
                existing.insert(key, value);
            }
        }
    }
}

fn check(tables: &HashMap<Collection, Table>, precondition: &Precondition) -> bool {
    let field_of = |collection: &Collection, id: &str, field: &str| -> Option<Value> {
        tables
            .get(collection)
            .and_then(|t| t.get(id))
            .map(|doc| doc.get(field).cloned().unwrap_or(Value::Null))
    };

    match precondition {
        Precondition::FieldEquals {
            collection,
            id,
            field,
            value,
        } => field_of(collection, id, field).is_some_and(|v| &v == value),
        Precondition::FieldIn {
            collection,
            id,
            field,
            values,
        } => field_of(collection, id, field).is_some_and(|v| values.contains(&v)),
        Precondition::NoneMatching { collection, filter } => tables
            .get(collection)
            .map_or(true, |t| !t.values().any(|doc| filter.matches(doc))),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.check_readable(collection)?;
        let tables = self.tables.read().await;
        Ok(tables.get(&collection).and_then(|t| t.get(id)).cloned())
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Vec<(String, Document)>> {
        self.check_readable(collection)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&collection)
            .map(|t| {
                t.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
        mode: WriteMode,
    ) -> StoreResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        apply(tables.entry(collection).or_default(), id, document, mode);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write().await;

        for precondition in batch.preconditions() {
            if !check(&tables, precondition) {
                return Err(StoreError::precondition_failed(precondition.to_string()));
            }
        }

        if self.faults.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::interrupted("injected commit failure"));
        }

        for op in batch.ops() {
            apply(
                tables.entry(op.collection).or_default(),
                &op.id,
                op.document.clone(),
                op.mode,
            );
        }
        self.faults.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> bool {
        !self.faults.unavailable.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Tests
// =============================================================================
