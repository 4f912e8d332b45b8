// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed access to portal documents.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{Collection, Document, DocumentStore, Filter, StoreError, StoreResult, WriteMode};
use crate::model::{ClaimRequest, ClaimType, MasterRecord, UserProfile};

/// Encodes a value as a document.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

/// Converts a `json!` object literal into a document.
///
/// Non-object values yield an empty document.
pub fn fields(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Decodes a document, filling `id_field` from the document key when absent.
pub fn from_document<T: DeserializeOwned>(
    id_field: &str,
    id: &str,
    mut document: Document,
) -> StoreResult<T> {
    document
        .entry(id_field.to_string())
        .or_insert_with(|| Value::String(id.to_string()));
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Typed repository over a [`DocumentStore`].
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    /// Wraps a store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Master records
    // -------------------------------------------------------------------------

    /// Reads a master record.
    pub async fn get_master(
        &self,
        claim_type: ClaimType,
        id: &str,
    ) -> StoreResult<Option<MasterRecord>> {
        self.store
            .get(claim_type.collection(), id)
            .await?
            .map(|doc| from_document("id", id, doc))
            .transpose()
    }

    /// Writes a master record.
    pub async fn put_master(&self, claim_type: ClaimType, record: &MasterRecord) -> StoreResult<()> {
        self.store
            .set(
                claim_type.collection(),
                &record.id,
                to_document(record)?,
                WriteMode::Replace,
            )
            .await
    }

    // -------------------------------------------------------------------------
    // Profiles
    // -------------------------------------------------------------------------

    /// Reads a user profile.
    pub async fn get_profile(&self, uid: &str) -> StoreResult<Option<UserProfile>> {
        self.store
            .get(Collection::Users, uid)
            .await?
            .map(|doc| from_document("uid", uid, doc))
            .transpose()
    }

    /// Writes a user profile.
    pub async fn put_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.store
            .set(
                Collection::Users,
                &profile.uid,
                to_document(profile)?,
                WriteMode::Replace,
            )
            .await
    }

    /// Overwrites selected profile fields.
    pub async fn merge_profile(&self, uid: &str, fields: Document) -> StoreResult<()> {
        self.store
            .set(Collection::Users, uid, fields, WriteMode::Merge)
            .await
    }

    /// Finds profiles by email.
    pub async fn find_profiles_by_email(&self, email: &str) -> StoreResult<Vec<UserProfile>> {
        self.store
            .query(Collection::Users, &Filter::new().eq("email", email))
            .await?
            .into_iter()
            .map(|(id, doc)| from_document("uid", &id, doc))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Claims
    // -------------------------------------------------------------------------

    /// Reads a claim request.
    pub async fn get_claim(&self, id: &str) -> StoreResult<Option<ClaimRequest>> {
        self.store
            .get(Collection::ClaimRequests, id)
            .await?
            .map(|doc| from_document("id", id, doc))
            .transpose()
    }

    /// Reads every claim matching the filter, in no particular order.
    pub async fn query_claims(&self, filter: &Filter) -> StoreResult<Vec<ClaimRequest>> {
        self.store
            .query(Collection::ClaimRequests, filter)
            .await?
            .into_iter()
            .map(|(id, doc)| from_document("id", &id, doc))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
