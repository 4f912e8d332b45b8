// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Startup fixtures for the in-memory store.
//!
//! A seed file is JSON with three optional lists:
//!
//! ```json
//! {
//!   "students": [{ "id": "0012345678", "name": "Budi Santoso", "verification_code": "1234" }],
//!   "teachers": [{ "id": "198001012005011001", "name": "Dra. Siti Aminah, M.Pd." }],
//!   "users": [{ "email": "admin@sekolah.id", "password": "rahasia123", "role": "ADMIN" }]
//! }
//! ```

use std::path::Path;

use portal_core::{AccountService, ClaimType, MasterRecord, Role};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{BinError, BinResult};

/// Parsed seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedData {
    /// Student master records.
    #[serde(default)]
    pub students: Vec<MasterRecord>,
    /// Staff master records.
    #[serde(default)]
    pub teachers: Vec<MasterRecord>,
    /// Password accounts to create.
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// An account created at startup.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Role code or alias; guests when absent.
    #[serde(default)]
    pub role: Option<String>,
}

/// Counts of what a seed run wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Student records written.
    pub students: usize,
    /// Staff records written.
    pub teachers: usize,
    /// Accounts created.
    pub users: usize,
}

impl SeedData {
    /// Reads and parses a seed file.
    pub fn load(path: &Path) -> BinResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BinError::seed(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content).map_err(|e| e.with_context(path.display().to_string()))
    }

    /// Parses seed JSON.
    pub fn parse(content: &str) -> BinResult<Self> {
        serde_json::from_str(content).map_err(|e| BinError::seed(e.to_string()))
    }

    /// Writes the records and accounts.
    ///
    /// Roles are checked before anything is written.
    pub async fn apply(&self, accounts: &AccountService) -> BinResult<SeedSummary> {
        let roles = self
            .users
            .iter()
            .map(|user| match &user.role {
                None => Ok(Role::default()),
                Some(raw) => Role::parse(raw).ok_or_else(|| {
                    BinError::seed(format!("unknown role '{}' for {}", raw, user.email))
                }),
            })
            .collect::<BinResult<Vec<Role>>>()?;

        let repo = accounts.repository();
        for (claim_type, records) in [
            (ClaimType::Student, &self.students),
            (ClaimType::Staff, &self.teachers),
        ] {
            for record in records {
                repo.put_master(claim_type, record)
                    .await
                    .map_err(|e| BinError::seed(format!("{} {}: {}", claim_type, record.id, e)))?;
            }
            debug!(collection = %claim_type, count = records.len(), "Seeded master records");
        }

        for (user, role) in self.users.iter().zip(roles) {
            let profile = accounts
                .register(&user.email, &user.password, &user.display_name)
                .await
                .map_err(|e| BinError::from(e).with_context(format!("seeding {}", user.email)))?;
            if role != Role::default() {
                accounts.assign_role(&profile.uid, role).await?;
            }
        }

        let summary = SeedSummary {
            students: self.students.len(),
            teachers: self.teachers.len(),
            users: self.users.len(),
        };
        info!(
            students = summary.students,
            teachers = summary.teachers,
            users = summary.users,
            "Seed data loaded"
        );
        Ok(summary)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use portal_core::{IdentityMatcher, InMemoryIdentityProvider, InMemoryStore, Repository};

    fn accounts() -> AccountService {
        let store = Arc::new(InMemoryStore::new());
        let repo = Repository::new(store);
        AccountService::new(
            repo.clone(),
            IdentityMatcher::new(repo),
            Arc::new(InMemoryIdentityProvider::new()),
        )
    }

    const SEED: &str = r#"{
        "students": [{ "id": "0012345678", "name": "Budi Santoso", "verification_code": "1234" }],
        "teachers": [{ "id": "198001012005011001", "name": "Dra. Siti Aminah, M.Pd." }],
        "users": [
            { "email": "admin@sekolah.id", "password": "rahasia123", "role": "admin" },
            { "email": "tamu@sekolah.id", "password": "rahasia123" }
        ]
    }"#;

    #[tokio::test]
    async fn test_apply_seed() {
        let accounts = accounts();
        let summary = SeedData::parse(SEED).unwrap().apply(&accounts).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                students: 1,
                teachers: 1,
                users: 2
            }
        );

        let repo = accounts.repository();
        let student = repo
            .get_master(ClaimType::Student, "0012345678")
            .await
            .unwrap()
            .unwrap();
        assert!(!student.claimed);

        let admin = accounts.login("admin@sekolah.id", "rahasia123").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
        let guest = accounts.login("tamu@sekolah.id", "rahasia123").await.unwrap();
        assert_eq!(guest.role, Role::Guest);
    }

    #[tokio::test]
    async fn test_unknown_role_writes_nothing() {
        let accounts = accounts();
        let seed = SeedData::parse(
            r#"{ "students": [{ "id": "1", "name": "A" }],
                 "users": [{ "email": "x@sekolah.id", "password": "rahasia123", "role": "KEPALA" }] }"#,
        )
        .unwrap();

        let err = seed.apply(&accounts).await.unwrap_err();
        assert!(err.to_string().contains("KEPALA"));
        assert!(accounts
            .repository()
            .get_master(ClaimType::Student, "1")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let seed = SeedData::load(file.path()).unwrap();
        assert_eq!(seed.students.len(), 1);
        assert_eq!(seed.users.len(), 2);
    }

    #[test]
    fn test_rejects_unknown_sections() {
        assert!(SeedData::parse(r#"{ "parents": [] }"#).is_err());
    }
}
