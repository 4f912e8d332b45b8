// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Account registration, login, self-activation and federated provisioning.
//!
//! Credentials are created in the [`IdentityProvider`] and profiles in the
//! document store. No transaction spans the two, so a profile write that
//! fails after a credential was created is followed by a best-effort
//! deletion of that credential. If the deletion also fails, the credential
//! is left orphaned (no profile, or an unlinked one) and a later activation
//! with the same email and password reclaims it.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::claims::claim_master;
use crate::error::{CoreError, CoreResult};
use crate::identity::{IdentityError, IdentityProvider, MIN_PASSWORD_LENGTH};
use crate::matching::IdentityMatcher;
use crate::model::{AccountStatus, AuthProvider, ClaimType, MasterRecord, UserProfile};
use crate::policy::{DirectActivationPolicy, VerificationPolicy};
use crate::role::{normalize_role_opt, Role};
use crate::store::{fields, to_document, Collection, Repository, StoreError, WriteBatch};

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Self-activation input.
#[derive(Debug, Clone)]
pub struct ActivationRequest {
    /// Login email.
    pub email: String,
    /// Login password.
    pub password: String,
    /// Display name; defaults to the master record's name.
    pub display_name: Option<String>,
    /// Record type.
    pub claim_type: ClaimType,
    /// Master record id.
    pub primary_id: String,
    /// Verification code.
    pub secondary_id: String,
}

/// Result of a completed self-activation.
#[derive(Debug, Clone)]
pub struct Activation {
    /// The linked profile.
    pub profile: UserProfile,
    /// The master record, as claimed.
    pub master: MasterRecord,
    /// `true` if an orphaned credential was reused.
    pub reclaimed: bool,
}

/// Result of resolving a federated login.
#[derive(Debug, Clone)]
pub struct FederatedLogin {
    /// The stored profile after the login.
    pub profile: UserProfile,
    /// `true` if the profile was provisioned by this login.
    pub created: bool,
}

/// Canonical form used for stored and compared emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> CoreResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::validation("email", "A valid email address is required"))
    }
}

fn validate_password(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(())
}

// =============================================================================
// AccountService
// =============================================================================

/// Account operations spanning the identity provider and the store.
#[derive(Clone)]
pub struct AccountService {
    repo: Repository,
    matcher: IdentityMatcher,
    identity: Arc<dyn IdentityProvider>,
}

impl AccountService {
    /// Creates a new service.
    pub fn new(repo: Repository, matcher: IdentityMatcher, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            repo,
            matcher,
            identity,
        }
    }

    /// Returns the repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Reads a profile.
    pub async fn profile(&self, uid: &str) -> CoreResult<UserProfile> {
        self.repo
            .get_profile(uid)
            .await?
            .ok_or_else(|| CoreError::not_found("User profile"))
    }

    /// Creates a password account with an unlinked guest profile.
    pub async fn register(&self, email: &str, password: &str, display_name: &str) -> CoreResult<UserProfile> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let uid = self.identity.create_user(&email, password).await?;
        let name = match display_name.trim() {
            "" => email.clone(),
            name => name.to_string(),
        };
        let profile = UserProfile::new(&uid, &email, name);

        if let Err(e) = self.repo.put_profile(&profile).await {
            self.compensate(&uid).await;
            return Err(e.into());
        }

        info!(user_id = %uid, "Account registered");
        Ok(profile)
    }

    /// Verifies a password login and stamps the login time.
    ///
    /// A credential without a profile gets a guest profile.
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<UserProfile> {
        let email = normalize_email(email);
        let uid = self.identity.sign_in(&email, password).await?;
        let now = Utc::now();

        match self.repo.get_profile(&uid).await? {
            Some(mut profile) => {
                self.repo
                    .merge_profile(&uid, fields(json!({ "last_login_at": now })))
                    .await?;
                profile.last_login_at = Some(now);
                Ok(profile)
            }
            None => {
                warn!(user_id = %uid, "Credential without profile, provisioning guest profile");
                let mut profile = UserProfile::new(&uid, &email, &email);
                profile.last_login_at = Some(now);
                self.repo.put_profile(&profile).await?;
                Ok(profile)
            }
        }
    }

    /// Creates (or reclaims) a credential and links it to a master record
    /// without review.
    ///
    /// Verification uses [`DirectActivationPolicy`] and fails with the same
    /// "no match" error for absent, claimed and mismatched records.
    pub async fn activate(&self, request: ActivationRequest) -> CoreResult<Activation> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;
        if request.secondary_id.trim().is_empty() {
            return Err(CoreError::validation("secondary_id", "Verification code is required"));
        }

        let claim_type = request.claim_type;
        let master = self
            .matcher
            .lookup_master(claim_type, &request.primary_id)
            .await?
            .ok_or_else(CoreError::no_match)?;
        if !DirectActivationPolicy.verify(claim_type, &master, &request.secondary_id) {
            debug!(claim_type = %claim_type, "Activation secondary key mismatch");
            return Err(CoreError::no_match());
        }

        let (uid, existing, reclaimed) = self.credential_for_activation(&email, &request.password).await?;

        match self.link(&uid, &email, &request, &master, existing).await {
            Ok(activation) => {
                info!(user_id = %uid, claim_type = %claim_type, reclaimed, "Account activated");
                Ok(Activation {
                    reclaimed,
                    ..activation
                })
            }
            Err(e) => {
                if !reclaimed {
                    self.compensate(&uid).await;
                }
                Err(e)
            }
        }
    }

    /// Returns `(uid, existing profile, reclaimed)`.
    async fn credential_for_activation(
        &self,
        email: &str,
        password: &str,
    ) -> CoreResult<(String, Option<UserProfile>, bool)> {
        match self.identity.create_user(email, password).await {
            Ok(uid) => Ok((uid, None, false)),
            Err(IdentityError::EmailExists) => {
                let uid = self
                    .identity
                    .find_by_email(email)
                    .await?
                    .ok_or(IdentityError::EmailExists)?;
                let existing = self.repo.get_profile(&uid).await?;
                if existing
                    .as_ref()
                    .is_some_and(|p| p.is_linked() || p.status == AccountStatus::Active)
                {
                    return Err(IdentityError::EmailExists.into());
                }

                let signed_in = self
                    .identity
                    .sign_in(email, password)
                    .await
                    .map_err(|_| IdentityError::EmailExists)?;
                if signed_in != uid {
                    return Err(IdentityError::EmailExists.into());
                }
                info!(user_id = %uid, "Reclaiming unlinked credential");
                Ok((uid, existing, true))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn link(
        &self,
        uid: &str,
        email: &str,
        request: &ActivationRequest,
        master: &MasterRecord,
        existing: Option<UserProfile>,
    ) -> CoreResult<Activation> {
        let claim_type = request.claim_type;
        let now = Utc::now();
        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&master.name);

        let mut profile = existing.unwrap_or_else(|| UserProfile::new(uid, email, display_name));
        profile.display_name = display_name.to_string();
        profile.role = claim_type.granted_role();
        profile.status = AccountStatus::Active;
        profile.linked_master_id = Some(master.id.clone());
        profile.linked_master_type = Some(claim_type);
        profile.claim_verified = true;
        profile.auth_provider = AuthProvider::Password;
        profile.updated_at = now;

        let batch = WriteBatch::new().set(Collection::Users, uid, to_document(&profile)?);
        let batch = claim_master(batch, claim_type, &master.id, uid);

        match self.repo.store().commit(batch).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed { .. }) => return Err(CoreError::no_match()),
            Err(e) => return Err(e.into()),
        }

        let mut master = master.clone();
        master.claimed = true;
        master.linked_user_id = Some(uid.to_string());
        master.status = AccountStatus::Active;

        Ok(Activation {
            profile,
            master,
            reclaimed: false,
        })
    }

    /// Deletes a credential whose profile write failed. A failed deletion is
    /// logged and otherwise ignored.
    async fn compensate(&self, uid: &str) {
        match self.identity.delete_user(uid).await {
            Ok(()) => debug!(user_id = %uid, "Compensating credential deletion succeeded"),
            Err(e) => warn!(
                user_id = %uid,
                error = %e,
                "Compensating credential deletion failed, credential left orphaned"
            ),
        }
    }

    /// Finds or provisions the profile for a verified federated identity.
    ///
    /// An existing profile keeps its role; only the name, email and login
    /// time are refreshed. A new profile takes its role from `role_claim`,
    /// defaulting to guest.
    pub async fn resolve_federated(
        &self,
        email: &str,
        name: Option<&str>,
        role_claim: Option<&str>,
    ) -> CoreResult<FederatedLogin> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(CoreError::validation("email", "Identity token has no email claim"));
        }
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let now = Utc::now();

        let mut profile = match self.repo.find_profiles_by_email(&email).await?.into_iter().next() {
            Some(profile) => Some(profile),
            None => match self.identity.find_by_email(&email).await? {
                Some(uid) => self.repo.get_profile(&uid).await?,
                None => None,
            },
        };

        if let Some(profile) = profile.as_mut() {
            let mut update = json!({
                "email": email,
                "last_login_at": now,
                "updated_at": now,
            });
            if let Some(name) = name {
                update["display_name"] = json!(name);
                profile.display_name = name.to_string();
            }
            self.repo.merge_profile(&profile.uid, fields(update)).await?;

            profile.email = email;
            profile.last_login_at = Some(now);
            profile.updated_at = now;
            debug!(user_id = %profile.uid, role = %profile.role, "Federated login for existing profile");
            return Ok(FederatedLogin {
                profile: profile.clone(),
                created: false,
            });
        }

        let uid = match self.identity.find_by_email(&email).await? {
            Some(uid) => uid,
            None => self.identity.create_federated_user(&email).await?,
        };

        let role = normalize_role_opt(role_claim, Role::Guest);
        let mut profile = UserProfile::new(&uid, &email, name.unwrap_or(&email))
            .with_role(role)
            .with_provider(AuthProvider::Sso);
        profile.status = AccountStatus::Active;
        profile.last_login_at = Some(now);
        self.repo.put_profile(&profile).await?;

        info!(user_id = %uid, role = %role, "Federated profile provisioned");
        Ok(FederatedLogin {
            profile,
            created: true,
        })
    }

    /// Sets a user's role by administrative decision.
    ///
    /// Returns the previous role.
    pub async fn assign_role(&self, uid: &str, role: Role) -> CoreResult<Role> {
        let profile = self.profile(uid).await?;
        self.repo
            .merge_profile(
                uid,
                fields(json!({ "role": role.code(), "updated_at": Utc::now() })),
            )
            .await?;
        info!(user_id = %uid, from = %profile.role, to = %role, "Role assigned");
        Ok(profile.role)
    }
}

// =============================================================================
// Tests
// =============================================================================
