// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication credential provider.
//!
//! Credentials live outside the document store, so there is no transaction
//! spanning a credential and the profile that refers to it. Callers that
//! create a credential and then fail must delete it themselves (see
//! [`crate::activation`]).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

// =============================================================================
// IdentityError
// =============================================================================

/// Identity provider errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A credential already exists for the email.
    #[error("Email already registered")]
    EmailExists,

    /// Email or password is wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No credential with this uid.
    #[error("User not found: {uid}")]
    UserNotFound {
        /// Credential uid.
        uid: String,
    },

    /// Password too short.
    #[error("Password must be at least {min} characters")]
    WeakPassword {
        /// Minimum length.
        min: usize,
    },

    /// Provider unreachable.
    #[error("Identity provider unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// Password hashing failed.
    #[error("Password hashing failed: {message}")]
    Hashing {
        /// Error message.
        message: String,
    },
}

impl IdentityError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` for transient failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IdentityError::Unavailable { .. })
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            IdentityError::EmailExists => 409,
            IdentityError::InvalidCredentials => 401,
            IdentityError::UserNotFound { .. } => 404,
            IdentityError::WeakPassword { .. } => 400,
            IdentityError::Unavailable { .. } => 503,
            IdentityError::Hashing { .. } => 500,
        }
    }
}

impl From<argon2::password_hash::Error> for IdentityError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::Hashing {
            message: e.to_string(),
        }
    }
}

/// A Result type with IdentityError.
pub type IdentityResult<T> = Result<T, IdentityError>;

// =============================================================================
// IdentityProvider
// =============================================================================

/// Credential store operations used by the portal.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a password credential and returns its uid.
    async fn create_user(&self, email: &str, password: &str) -> IdentityResult<String>;

    /// Creates a credential for a federated identity and returns its uid.
    async fn create_federated_user(&self, email: &str) -> IdentityResult<String>;

    /// Verifies a password and returns the uid.
    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<String>;

    /// Returns the uid registered for an email.
    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<String>>;

    /// Deletes a credential.
    async fn delete_user(&self, uid: &str) -> IdentityResult<()>;

    /// Returns the provider name.
    fn name(&self) -> &str {
        "identity_provider"
    }
}

// =============================================================================
// InMemoryIdentityProvider
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    email: String,
    password_hash: Option<String>,
}

#[derive(Default)]
struct Accounts {
    by_uid: HashMap<String, Account>,
    by_email: HashMap<String, String>,
}

/// Process-local [`IdentityProvider`] with argon2 password hashes.
///
/// Emails are compared case-insensitively. Clones share state.
#[derive(Clone)]
pub struct InMemoryIdentityProvider {
    accounts: Arc<RwLock<Accounts>>,
    hasher: Argon2<'static>,
    fail_deletes: Arc<AtomicBool>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    /// Creates a provider using argon2id default parameters.
    pub fn new() -> Self {
        Self::with_hasher(Argon2::default())
    }

    /// Creates a provider with minimal hashing cost, for tests and demos.
    pub fn with_low_cost_hashing() -> Self {
        let params = Params::new(Params::MIN_M_COST.max(1024), 1, 1, None).unwrap_or_default();
        Self::with_hasher(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn with_hasher(hasher: Argon2<'static>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(Accounts::default())),
            hasher,
            fail_deletes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every [`IdentityProvider::delete_user`] call fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Returns `true` if a credential with this uid exists.
    pub fn contains(&self, uid: &str) -> bool {
        self.accounts.read().by_uid.contains_key(uid)
    }

    /// Returns the number of credentials.
    pub fn len(&self) -> usize {
        self.accounts.read().by_uid.len()
    }

    /// Returns `true` if there are no credentials.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, email: &str, password_hash: Option<String>) -> IdentityResult<String> {
        let key = email_key(email);
        let mut accounts = self.accounts.write();
        if accounts.by_email.contains_key(&key) {
            return Err(IdentityError::EmailExists);
        }

        let uid = Uuid::new_v4().simple().to_string();
        accounts.by_email.insert(key, uid.clone());
        accounts.by_uid.insert(
            uid.clone(),
            Account {
                email: email.trim().to_string(),
                password_hash,
            },
        );
        Ok(uid)
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> IdentityResult<String> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if self.accounts.read().by_email.contains_key(&email_key(email)) {
            return Err(IdentityError::EmailExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self.hasher.hash_password(password.as_bytes(), &salt)?.to_string();
        self.insert(email, Some(hash))
    }

    async fn create_federated_user(&self, email: &str) -> IdentityResult<String> {
        self.insert(email, None)
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<String> {
        let (uid, stored) = {
            let accounts = self.accounts.read();
            let uid = accounts
                .by_email
                .get(&email_key(email))
                .ok_or(IdentityError::InvalidCredentials)?;
            let stored = accounts
                .by_uid
                .get(uid)
                .and_then(|a| a.password_hash.clone())
                .ok_or(IdentityError::InvalidCredentials)?;
            (uid.clone(), stored)
        };

        let parsed = PasswordHash::new(&stored)?;
        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| IdentityError::InvalidCredentials)?;
        Ok(uid)
    }

    async fn find_by_email(&self, email: &str) -> IdentityResult<Option<String>> {
        Ok(self.accounts.read().by_email.get(&email_key(email)).cloned())
    }

    async fn delete_user(&self, uid: &str) -> IdentityResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(IdentityError::unavailable("delete rejected"));
        }

        let mut accounts = self.accounts.write();
        let account = accounts
            .by_uid
            .remove(uid)
            .ok_or_else(|| IdentityError::UserNotFound {
                uid: uid.to_string(),
            })?;
        accounts.by_email.remove(&email_key(&account.email));
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> InMemoryIdentityProvider {
        InMemoryIdentityProvider::with_low_cost_hashing()
    }

    #[tokio::test]
    async fn test_create_and_sign_in() {
        let idp = provider();
        let uid = idp.create_user("Ani@School.id", "secret1").await.unwrap();

        assert_eq!(idp.sign_in("ani@school.id", "secret1").await.unwrap(), uid);
        assert!(matches!(
            idp.sign_in("ani@school.id", "wrong!!").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            idp.sign_in("nobody@school.id", "secret1").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let idp = provider();
        idp.create_user("a@school.id", "secret1").await.unwrap();
        assert!(matches!(
            idp.create_user(" A@school.id ", "secret2").await,
            Err(IdentityError::EmailExists)
        ));
        assert!(matches!(
            idp.create_federated_user("a@school.id").await,
            Err(IdentityError::EmailExists)
        ));
    }

    #[tokio::test]
    async fn test_weak_password() {
        let idp = provider();
        let err = idp.create_user("a@school.id", "12345").await.unwrap_err();
        assert!(matches!(err, IdentityError::WeakPassword { min: 6 }));
        assert!(idp.is_empty());
    }

    #[tokio::test]
    async fn test_federated_user_cannot_password_sign_in() {
        let idp = provider();
        let uid = idp.create_federated_user("sso@school.id").await.unwrap();
        assert_eq!(idp.find_by_email("SSO@school.id").await.unwrap(), Some(uid));
        assert!(idp.sign_in("sso@school.id", "anything").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_fault() {
        let idp = provider();
        let uid = idp.create_user("a@school.id", "secret1").await.unwrap();

        idp.fail_deletes(true);
        assert!(idp.delete_user(&uid).await.unwrap_err().is_retryable());
        assert!(idp.contains(&uid));

        idp.fail_deletes(false);
        idp.delete_user(&uid).await.unwrap();
        assert!(!idp.contains(&uid));
        assert_eq!(idp.find_by_email("a@school.id").await.unwrap(), None);
        assert!(matches!(
            idp.delete_user(&uid).await,
            Err(IdentityError::UserNotFound { .. })
        ));
    }
}
