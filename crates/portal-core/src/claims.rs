// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Claim lifecycle manager.
//!
//! ```text
//!         submit              open_for_review           approve
//! (none) -------> pending -------------------> reviewing -------> approved
//!                    \                             \
//!                     +----------- reject ----------+-----------> rejected
//! ```
//!
//! Every transition is a conditional write: the store re-checks the claim's
//! status (and for approval, the master record's `claimed` flag and the
//! profile's link) inside the same commit that applies the change. Two
//! administrators racing on the same claim or the same master record cannot
//! both succeed, and a profile is never linked to a second record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::matching::IdentityMatcher;
use crate::model::{ClaimRequest, ClaimStatus, ClaimType, MasterRecord, StatusFilter};
use crate::policy::{ReviewedClaimPolicy, VerificationPolicy};
use crate::store::{
    fields, to_document, Collection, Filter, Precondition, Repository, StoreError, WriteBatch,
};

// =============================================================================
// Inputs and Views
// =============================================================================

/// A claim submission.
#[derive(Debug, Clone)]
pub struct SubmitClaim {
    /// Requesting user.
    pub user_id: String,
    /// Requester display name.
    pub user_name: String,
    /// Requester email.
    pub user_email: String,
    /// Target record type.
    pub claim_type: ClaimType,
    /// Target master record id.
    pub target_id: String,
    /// Secondary verification input.
    pub secondary_input: String,
}

/// What an administrator sees when opening a claim.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    /// The claim after the review transition.
    pub claim: ClaimRequest,
    /// The referenced master record, if it could be read.
    pub master: Option<MasterRecord>,
    /// Why the master record could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_error: Option<String>,
}

// =============================================================================
// Batch Helpers
// =============================================================================

fn active_status_values() -> Vec<Value> {
    ClaimStatus::ACTIVE
        .iter()
        .map(|s| Value::String(s.as_str().to_string()))
        .collect()
}

/// Requires the claim to still be pending or reviewing.
fn require_active(claim_id: &str) -> Precondition {
    Precondition::FieldIn {
        collection: Collection::ClaimRequests,
        id: claim_id.to_string(),
        field: "status".to_string(),
        values: active_status_values(),
    }
}

fn require_status(claim_id: &str, status: ClaimStatus) -> Precondition {
    Precondition::FieldEquals {
        collection: Collection::ClaimRequests,
        id: claim_id.to_string(),
        field: "status".to_string(),
        value: json!(status.as_str()),
    }
}

/// Requires the profile to exist and not be linked to any master record.
fn require_unlinked(uid: &str) -> Precondition {
    Precondition::FieldIn {
        collection: Collection::Users,
        id: uid.to_string(),
        field: "linked_master_id".to_string(),
        values: vec![Value::Null],
    }
}

/// Adds the master-record half of a link: the record must exist and be
/// unclaimed at commit time, and is marked claimed by `uid`.
pub(crate) fn claim_master(
    batch: WriteBatch,
    claim_type: ClaimType,
    master_id: &str,
    uid: &str,
) -> WriteBatch {
    batch
        .require(Precondition::FieldIn {
            collection: claim_type.collection(),
            id: master_id.to_string(),
            field: "claimed".to_string(),
            values: vec![Value::Bool(false), Value::Null],
        })
        .merge(
            claim_type.collection(),
            master_id,
            fields(json!({
                "claimed": true,
                "linked_user_id": uid,
                "status": "active",
            })),
        )
}

/// Profile fields written when a link is finalized.
pub(crate) fn linked_profile_fields(
    claim_type: ClaimType,
    master_id: &str,
    now: DateTime<Utc>,
) -> Value {
    json!({
        "role": claim_type.granted_role().code(),
        "status": "active",
        "linked_master_id": master_id,
        "linked_master_type": claim_type.as_str(),
        "claim_verified": true,
        "updated_at": now,
    })
}

fn transition_conflict(claim: &ClaimRequest, action: &str) -> CoreError {
    CoreError::conflict(format!(
        "Claim {} cannot be {action}: status is {}",
        claim.id, claim.status
    ))
}

// =============================================================================
// ClaimService
// =============================================================================

/// Claim lifecycle operations.
#[derive(Clone)]
pub struct ClaimService {
    repo: Repository,
    matcher: IdentityMatcher,
    policy: Arc<dyn VerificationPolicy>,
}

impl ClaimService {
    /// Creates a service using [`ReviewedClaimPolicy`] for match hints.
    pub fn new(repo: Repository, matcher: IdentityMatcher) -> Self {
        Self {
            repo,
            matcher,
            policy: Arc::new(ReviewedClaimPolicy),
        }
    }

    /// Returns the repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Records a new pending claim.
    ///
    /// Fails with a conflict if the user is already linked to a master record
    /// or already has a pending or reviewing claim. The `auto_match` hint is computed best-effort: a lookup failure
    /// records `false` rather than blocking the submission.
    pub async fn submit(&self, request: SubmitClaim) -> CoreResult<ClaimRequest> {
        let target_id = request.target_id.trim().to_string();
        let secondary = request.secondary_input.trim().to_string();
        if target_id.is_empty() {
            return Err(CoreError::validation("target_id", "Target id is required"));
        }
        if secondary.is_empty() {
            return Err(CoreError::validation("secondary_id", "Secondary id is required"));
        }

        if let Some(profile) = self.repo.get_profile(&request.user_id).await? {
            if profile.linked_master_id.is_some() {
                return Err(CoreError::conflict("This account is already linked to a record"));
            }
        }

        let active_filter = Filter::new()
            .eq("user_id", request.user_id.as_str())
            .any_of("status", active_status_values());

        if !self.repo.query_claims(&active_filter).await?.is_empty() {
            return Err(CoreError::conflict("An active claim already exists for this user"));
        }

        let auto_match = match self.matcher.lookup_master(request.claim_type, &target_id).await {
            Ok(Some(record)) => self.policy.verify(request.claim_type, &record, &secondary),
            Ok(None) => false,
            Err(e) => {
                warn!(user_id = %request.user_id, error = %e, "Match hint lookup failed");
                false
            }
        };

        let claim = ClaimRequest {
            id: Uuid::now_v7().to_string(),
            user_id: request.user_id,
            user_name: request.user_name,
            user_email: request.user_email,
            claim_type: request.claim_type,
            target_id,
            secondary_input: secondary,
            status: ClaimStatus::Pending,
            auto_match,
            created_at: Utc::now(),
            processed_by: None,
            processed_at: None,
            rejection_reason: None,
        };

        let batch = WriteBatch::new()
            .require(Precondition::NoneMatching {
                collection: Collection::ClaimRequests,
                filter: active_filter,
            })
            .set(Collection::ClaimRequests, &claim.id, to_document(&claim)?);

        match self.repo.store().commit(batch).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed { .. }) => {
                return Err(CoreError::conflict("An active claim already exists for this user"));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            claim_id = %claim.id,
            user_id = %claim.user_id,
            claim_type = %claim.claim_type,
            auto_match = claim.auto_match,
            "Claim submitted"
        );
        Ok(claim)
    }

    /// Opens a claim for review and fetches its master record.
    ///
    /// Moves `pending` to `reviewing`; any other status is left unchanged.
    /// Concurrent openings are harmless. A failure to read the master record
    /// is returned in the view instead of failing the call.
    pub async fn open_for_review(&self, claim_id: &str, admin_id: &str) -> CoreResult<ReviewView> {
        let mut claim = self.get(claim_id).await?;

        if claim.status == ClaimStatus::Pending {
            let now = Utc::now();
            let batch = WriteBatch::new()
                .require(require_status(&claim.id, ClaimStatus::Pending))
                .merge(
                    Collection::ClaimRequests,
                    &claim.id,
                    fields(json!({
                        "status": ClaimStatus::Reviewing.as_str(),
                        "processed_by": admin_id,
                        "processed_at": now,
                    })),
                );

            match self.repo.store().commit(batch).await {
                Ok(()) => {
                    claim.status = ClaimStatus::Reviewing;
                    claim.processed_by = Some(admin_id.to_string());
                    claim.processed_at = Some(now);
                    info!(claim_id = %claim.id, admin_id, "Claim opened for review");
                }
                Err(StoreError::PreconditionFailed { .. }) => {
                    claim = self.get(claim_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (master, master_error) = match self.repo.get_master(claim.claim_type, &claim.target_id).await {
            Ok(master) => (master, None),
            Err(e) => {
                warn!(claim_id = %claim.id, error = %e, "Master record fetch failed");
                (None, Some(e.to_string()))
            }
        };

        Ok(ReviewView {
            claim,
            master,
            master_error,
        })
    }

    /// Approves a claim and links the claimant to the master record.
    ///
    /// Only a claim under review can be approved. The claim, the profile
    /// and the master record are written in one batch, conditional on the
    /// claim still being under review, the profile existing unlinked and
    /// the master record being unclaimed.
    pub async fn approve(&self, claim_id: &str, admin_id: &str) -> CoreResult<ClaimRequest> {
        let mut claim = self.get(claim_id).await?;
        if claim.status != ClaimStatus::Reviewing {
            return Err(transition_conflict(&claim, "approved"));
        }

        let now = Utc::now();
        let batch = WriteBatch::new()
            .require(require_status(&claim.id, ClaimStatus::Reviewing))
            .require(require_unlinked(&claim.user_id))
            .merge(
                Collection::ClaimRequests,
                &claim.id,
                fields(json!({
                    "status": ClaimStatus::Approved.as_str(),
                    "processed_by": admin_id,
                    "processed_at": now,
                })),
            )
            .merge(
                Collection::Users,
                &claim.user_id,
                fields(linked_profile_fields(claim.claim_type, &claim.target_id, now)),
            );
        let batch = claim_master(batch, claim.claim_type, &claim.target_id, &claim.user_id);

        match self.repo.store().commit(batch).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed { message }) => {
                warn!(claim_id = %claim.id, %message, "Claim approval precondition failed");
                return Err(CoreError::conflict(
                    "Claim could not be approved: it was already processed, the account is already linked or the record is no longer available",
                ));
            }
            Err(e) => return Err(e.into()),
        }

        claim.status = ClaimStatus::Approved;
        claim.processed_by = Some(admin_id.to_string());
        claim.processed_at = Some(now);

        info!(
            claim_id = %claim.id,
            user_id = %claim.user_id,
            target_id = %claim.target_id,
            admin_id,
            "Claim approved"
        );
        Ok(claim)
    }

    /// Rejects a claim. The reason is required.
    pub async fn reject(&self, claim_id: &str, admin_id: &str, reason: &str) -> CoreResult<ClaimRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::validation("reason", "A rejection reason is required"));
        }

        let mut claim = self.get(claim_id).await?;
        if claim.status.is_terminal() {
            return Err(transition_conflict(&claim, "rejected"));
        }

        let now = Utc::now();
        let batch = WriteBatch::new().require(require_active(&claim.id)).merge(
            Collection::ClaimRequests,
            &claim.id,
            fields(json!({
                "status": ClaimStatus::Rejected.as_str(),
                "processed_by": admin_id,
                "processed_at": now,
                "rejection_reason": reason,
            })),
        );

        match self.repo.store().commit(batch).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed { .. }) => {
                return Err(CoreError::conflict("Claim was already processed"));
            }
            Err(e) => return Err(e.into()),
        }

        claim.status = ClaimStatus::Rejected;
        claim.processed_by = Some(admin_id.to_string());
        claim.processed_at = Some(now);
        claim.rejection_reason = Some(reason.to_string());

        info!(claim_id = %claim.id, admin_id, "Claim rejected");
        Ok(claim)
    }

    /// Lists claims by status, newest first.
    pub async fn list_by_status(&self, status: StatusFilter) -> CoreResult<Vec<ClaimRequest>> {
        let filter = match status {
            StatusFilter::All => Filter::new(),
            StatusFilter::Only(s) => Filter::new().eq("status", s.as_str()),
        };
        let mut claims = self.repo.query_claims(&filter).await?;
        sort_newest_first(&mut claims);
        Ok(claims)
    }

    /// Lists a user's own claims, newest first.
    ///
    /// A permission-denied read degrades to an empty list.
    pub async fn list_for_user(&self, user_id: &str) -> CoreResult<Vec<ClaimRequest>> {
        match self.repo.query_claims(&Filter::new().eq("user_id", user_id)).await {
            Ok(mut claims) => {
                sort_newest_first(&mut claims);
                Ok(claims)
            }
            Err(e) if e.is_permission_denied() => {
                warn!(user_id, "Claim history read denied, returning empty list");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads one claim.
    pub async fn get(&self, claim_id: &str) -> CoreResult<ClaimRequest> {
        self.repo
            .get_claim(claim_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Claim request"))
    }
}

fn sort_newest_first(claims: &mut [ClaimRequest]) {
    claims.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountStatus, UserProfile};
    use crate::role::Role;
    use crate::store::{DocumentStore, InMemoryStore};

    struct Fixture {
        store: InMemoryStore,
        service: ClaimService,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let repo = Repository::new(Arc::new(store.clone()));
        repo.put_master(
            ClaimType::Student,
            &MasterRecord::new("1234567890", "Budi Santoso").with_verification_code("9999"),
        )
        .await
        .unwrap();
        repo.put_master(
            ClaimType::Staff,
            &MasterRecord::new("198501012010", "Drs. Ahmad Fauzi, S.Pd., M.Pd"),
        )
        .await
        .unwrap();
        for uid in ["u1", "u2"] {
            repo.put_profile(&UserProfile::new(uid, format!("{uid}@school.id"), uid))
                .await
                .unwrap();
        }

        let matcher = IdentityMatcher::new(repo.clone());
        Fixture {
            store,
            service: ClaimService::new(repo, matcher),
        }
    }

    fn submission(user: &str, claim_type: ClaimType, target: &str, secondary: &str) -> SubmitClaim {
        SubmitClaim {
            user_id: user.to_string(),
            user_name: user.to_string(),
            user_email: format!("{user}@school.id"),
            claim_type,
            target_id: target.to_string(),
            secondary_input: secondary.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_sets_match_hint() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert!(claim.auto_match);

        let claim = f
            .service
            .submit(submission("u2", ClaimType::Staff, "198501012010", "ahmad fauzi"))
            .await
            .unwrap();
        assert!(claim.auto_match);
    }

    #[tokio::test]
    async fn test_submit_without_match_still_records() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "0000000000", "1"))
            .await
            .unwrap();
        assert!(!claim.auto_match);
        assert_eq!(f.store.len(Collection::ClaimRequests).await, 1);
    }

    #[tokio::test]
    async fn test_submit_lookup_failure_is_not_fatal() {
        let f = fixture().await;
        f.store.deny_reads(Collection::Students);
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        assert!(!claim.auto_match);
    }

    #[tokio::test]
    async fn test_second_active_claim_conflicts() {
        let f = fixture().await;
        f.service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        let err = f
            .service
            .submit(submission("u1", ClaimType::Staff, "198501012010", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_resubmit_after_rejection() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "1"))
            .await
            .unwrap();
        f.service.reject(&claim.id, "admin", "wrong code").await.unwrap();
        f.service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let f = fixture().await;
        let err = f
            .service
            .submit(submission("u1", ClaimType::Student, "  ", "9999"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", ""))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_open_for_review_is_idempotent() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();

        let first = f.service.open_for_review(&claim.id, "admin-a").await.unwrap();
        assert_eq!(first.claim.status, ClaimStatus::Reviewing);
        assert_eq!(first.master.unwrap().name, "Budi Santoso");

        let second = f.service.open_for_review(&claim.id, "admin-b").await.unwrap();
        assert_eq!(second.claim.status, ClaimStatus::Reviewing);
        assert_eq!(second.claim.processed_by.as_deref(), Some("admin-a"));
    }

    #[tokio::test]
    async fn test_open_for_review_surfaces_master_error() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();

        f.store.deny_reads(Collection::Students);
        let view = f.service.open_for_review(&claim.id, "admin").await.unwrap();
        assert_eq!(view.claim.status, ClaimStatus::Reviewing);
        assert!(view.master.is_none());
        assert!(view.master_error.is_some());
    }

    #[tokio::test]
    async fn test_approve_links_all_three_records() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        f.service.open_for_review(&claim.id, "admin").await.unwrap();
        let approved = f.service.approve(&claim.id, "admin").await.unwrap();
        assert_eq!(approved.status, ClaimStatus::Approved);

        let repo = f.service.repository();
        let profile = repo.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Student);
        assert!(profile.claim_verified);
        assert_eq!(profile.status, AccountStatus::Active);
        assert_eq!(profile.linked_master_id.as_deref(), Some("1234567890"));

        let master = repo.get_master(ClaimType::Student, "1234567890").await.unwrap().unwrap();
        assert!(master.claimed);
        assert_eq!(master.linked_user_id.as_deref(), Some("u1"));

        let stored = f.service.get(&claim.id).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::Approved);
    }

    #[tokio::test]
    async fn test_interrupted_approval_writes_nothing() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();

        f.service.open_for_review(&claim.id, "admin").await.unwrap();

        f.store.fail_next_commit();
        let err = f.service.approve(&claim.id, "admin").await.unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Interrupted { .. })));

        let repo = f.service.repository();
        assert_eq!(f.service.get(&claim.id).await.unwrap().status, ClaimStatus::Reviewing);
        assert_eq!(repo.get_profile("u1").await.unwrap().unwrap().role, Role::Guest);
        assert!(!repo.get_master(ClaimType::Student, "1234567890").await.unwrap().unwrap().claimed);

        f.service.approve(&claim.id, "admin").await.unwrap();
    }

    #[tokio::test]
    async fn test_approve_claimed_record_conflicts() {
        let f = fixture().await;
        let first = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        let second = f
            .service
            .submit(submission("u2", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();

        f.service.open_for_review(&first.id, "admin").await.unwrap();
        f.service.open_for_review(&second.id, "admin").await.unwrap();

        f.service.approve(&first.id, "admin").await.unwrap();
        let err = f.service.approve(&second.id, "admin").await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));

        let profile = f.service.repository().get_profile("u2").await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Guest);
        assert_eq!(f.service.get(&second.id).await.unwrap().status, ClaimStatus::Reviewing);
    }

    #[tokio::test]
    async fn test_approve_missing_master_conflicts() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "9999999999", "x"))
            .await
            .unwrap();
        f.service.open_for_review(&claim.id, "admin").await.unwrap();
        let err = f.service.approve(&claim.id, "admin").await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(f.store.len(Collection::Students).await, 1);
    }

    #[tokio::test]
    async fn test_approve_requires_review() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();

        let err = f.service.approve(&claim.id, "admin").await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(f.service.get(&claim.id).await.unwrap().status, ClaimStatus::Pending);
        let master = f
            .service
            .repository()
            .get_master(ClaimType::Student, "1234567890")
            .await
            .unwrap()
            .unwrap();
        assert!(!master.claimed);
    }

    #[tokio::test]
    async fn test_linked_user_cannot_submit_again() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        f.service.open_for_review(&claim.id, "admin").await.unwrap();
        f.service.approve(&claim.id, "admin").await.unwrap();

        let err = f
            .service
            .submit(submission("u1", ClaimType::Staff, "198501012010", "ahmad fauzi"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
        assert_eq!(f.store.len(Collection::ClaimRequests).await, 1);
    }

    #[tokio::test]
    async fn test_approve_conflicts_when_profile_linked_meanwhile() {
        let f = fixture().await;
        let repo = f.service.repository();
        repo.put_master(ClaimType::Student, &MasterRecord::new("2222222222", "Budi Lain"))
            .await
            .unwrap();

        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "2222222222", "x"))
            .await
            .unwrap();
        f.service.open_for_review(&claim.id, "admin").await.unwrap();

        let mut profile = repo.get_profile("u1").await.unwrap().unwrap();
        profile.linked_master_id = Some("1234567890".to_string());
        profile.claim_verified = true;
        repo.put_profile(&profile).await.unwrap();

        let err = f.service.approve(&claim.id, "admin").await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));

        let other = repo.get_master(ClaimType::Student, "2222222222").await.unwrap().unwrap();
        assert!(!other.claimed);
        assert!(other.linked_user_id.is_none());
        let profile = repo.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.linked_master_id.as_deref(), Some("1234567890"));
        assert_eq!(f.service.get(&claim.id).await.unwrap().status, ClaimStatus::Reviewing);
    }

    #[tokio::test]
    async fn test_terminal_claims_cannot_transition() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        f.service.reject(&claim.id, "admin", "mismatch").await.unwrap();

        assert!(f.service.approve(&claim.id, "admin").await.is_err());
        assert!(f.service.reject(&claim.id, "admin", "again").await.is_err());
        let view = f.service.open_for_review(&claim.id, "admin").await.unwrap();
        assert_eq!(view.claim.status, ClaimStatus::Rejected);
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let f = fixture().await;
        let claim = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        let err = f.service.reject(&claim.id, "admin", "  ").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        let rejected = f.service.reject(&claim.id, "admin", "wrong person").await.unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("wrong person"));
        let master = f
            .service
            .repository()
            .get_master(ClaimType::Student, "1234567890")
            .await
            .unwrap()
            .unwrap();
        assert!(!master.claimed);
    }

    #[tokio::test]
    async fn test_list_by_status_newest_first() {
        let f = fixture().await;
        let a = f
            .service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let b = f
            .service
            .submit(submission("u2", ClaimType::Staff, "198501012010", "x"))
            .await
            .unwrap();
        f.service.reject(&a.id, "admin", "no").await.unwrap();

        let all = f.service.list_by_status(StatusFilter::All).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str()]);

        let pending = f
            .service
            .list_by_status(StatusFilter::Only(ClaimStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
    }

    #[tokio::test]
    async fn test_list_for_user_degrades_on_denied_read() {
        let f = fixture().await;
        f.service
            .submit(submission("u1", ClaimType::Student, "1234567890", "9999"))
            .await
            .unwrap();
        assert_eq!(f.service.list_for_user("u1").await.unwrap().len(), 1);

        f.store.deny_reads(Collection::ClaimRequests);
        assert!(f.service.list_for_user("u1").await.unwrap().is_empty());
        assert!(f.service.list_by_status(StatusFilter::All).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_claim() {
        let f = fixture().await;
        let err = f.service.approve("nope", "admin").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(f.store.get(Collection::ClaimRequests, "nope").await.unwrap().is_none());
    }
}
