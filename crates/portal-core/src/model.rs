// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Domain records persisted in the document store.
//!
//! ```text
//! users/{uid}             UserProfile
//! students/{nisn}         MasterRecord (ClaimType::Student)
//! teachers/{nip}          MasterRecord (ClaimType::Staff)
//! claim_requests/{id}     ClaimRequest
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::store::Collection;

// =============================================================================
// Claim Type
// =============================================================================

/// Kind of master record a claim targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    /// Student record, keyed by national student number.
    #[serde(rename = "siswa", alias = "student")]
    Student,
    /// Staff record, keyed by national staff number.
    #[serde(rename = "guru", alias = "staff", alias = "gtk")]
    Staff,
}

impl ClaimType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Student => "siswa",
            ClaimType::Staff => "guru",
        }
    }

    /// Parses a claim type, accepting Indonesian and English names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "siswa" | "student" => Some(ClaimType::Student),
            "guru" | "staff" | "gtk" | "teacher" => Some(ClaimType::Staff),
            _ => None,
        }
    }

    /// Collection holding master records of this type.
    pub fn collection(&self) -> Collection {
        match self {
            ClaimType::Student => Collection::Students,
            ClaimType::Staff => Collection::Teachers,
        }
    }

    /// Role granted once a claim of this type is finalized.
    pub fn granted_role(&self) -> Role {
        match self {
            ClaimType::Student => Role::Student,
            ClaimType::Staff => Role::Teacher,
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Claim Status
// =============================================================================

/// Claim request state.
///
/// ```text
/// pending -> reviewing -> approved
///    \            \
///     +------------+----> rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Submitted, not yet inspected.
    Pending,
    /// Opened by an administrator.
    Reviewing,
    /// Finalized and linked.
    Approved,
    /// Refused with a reason.
    Rejected,
}

impl ClaimStatus {
    /// Statuses counted against the one-active-claim rule.
    pub const ACTIVE: [ClaimStatus; 2] = [ClaimStatus::Pending, ClaimStatus::Reviewing];

    /// Returns the status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Reviewing => "reviewing",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Parses a status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ClaimStatus::Pending),
            "reviewing" => Some(ClaimStatus::Reviewing),
            "approved" => Some(ClaimStatus::Approved),
            "rejected" => Some(ClaimStatus::Rejected),
            _ => None,
        }
    }

    /// Returns `true` for pending and reviewing.
    pub fn is_active(&self) -> bool {
        matches!(self, ClaimStatus::Pending | ClaimStatus::Reviewing)
    }

    /// Returns `true` for approved and rejected.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status selector for claim listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Every claim regardless of status.
    All,
    /// Claims in one status.
    Only(ClaimStatus),
}

impl StatusFilter {
    /// Parses `all` or a status name.
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(StatusFilter::All);
        }
        ClaimStatus::parse(s).map(StatusFilter::Only)
    }
}

// =============================================================================
// Account Status
// =============================================================================

/// Activation status shared by profiles and master records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Linked and usable.
    Active,
    /// Not yet linked.
    #[default]
    Inactive,
}

/// How a profile's credential was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password.
    #[default]
    Password,
    /// Federated single sign-on.
    Sso,
}

// =============================================================================
// Master Record
// =============================================================================

/// Authoritative student or staff record from school administrative data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    /// Institution-issued identifier (NISN for students, NIP/NUPTK for staff).
    pub id: String,
    /// Full name as imported, possibly decorated with titles.
    pub name: String,
    /// Internal unique verification code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    /// Whether a user has claimed this record.
    #[serde(default)]
    pub claimed: bool,
    /// Linked user id once claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_user_id: Option<String>,
    /// Activation status.
    #[serde(default)]
    pub status: AccountStatus,
}

impl MasterRecord {
    /// Creates an unclaimed record.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            verification_code: None,
            claimed: false,
            linked_user_id: None,
            status: AccountStatus::Inactive,
        }
    }

    /// Sets the verification code.
    pub fn with_verification_code(mut self, code: impl Into<String>) -> Self {
        self.verification_code = Some(code.into());
        self
    }
}

// =============================================================================
// User Profile
// =============================================================================

/// Internal profile, one per authentication credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Internal user id (credential uid).
    pub uid: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Assigned role.
    #[serde(default)]
    pub role: Role,
    /// Activation status.
    #[serde(default)]
    pub status: AccountStatus,
    /// Linked master record id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_master_id: Option<String>,
    /// Linked master record type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_master_type: Option<ClaimType>,
    /// Set once a claim or activation has verified the link.
    #[serde(default)]
    pub claim_verified: bool,
    /// Credential origin.
    #[serde(default)]
    pub auth_provider: AuthProvider,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Last successful login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Creates an unlinked guest profile.
    pub fn new(uid: impl Into<String>, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            email: email.into(),
            role: Role::Guest,
            status: AccountStatus::Inactive,
            linked_master_id: None,
            linked_master_type: None,
            claim_verified: false,
            auth_provider: AuthProvider::Password,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Sets the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Sets the credential origin.
    pub fn with_provider(mut self, provider: AuthProvider) -> Self {
        self.auth_provider = provider;
        self
    }

    /// Returns `true` if the profile is linked to a master record.
    pub fn is_linked(&self) -> bool {
        self.linked_master_id.is_some() && self.claim_verified
    }
}

// =============================================================================
// Claim Request
// =============================================================================

/// A user's assertion that they own a master record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Claim id.
    pub id: String,
    /// Requesting user.
    pub user_id: String,
    /// Requester display name at submission time.
    #[serde(default)]
    pub user_name: String,
    /// Requester email at submission time.
    #[serde(default)]
    pub user_email: String,
    /// Target record type.
    pub claim_type: ClaimType,
    /// Target master record id.
    pub target_id: String,
    /// Secondary verification input as typed.
    pub secondary_input: String,
    /// Current state.
    pub status: ClaimStatus,
    /// Advisory match hint for reviewers.
    #[serde(default)]
    pub auto_match: bool,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Administrator who last transitioned the claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
    /// Time of the last transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    /// Reason given on rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
