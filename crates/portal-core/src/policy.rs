// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Secondary-key verification policies.
//!
//! The reviewed claim flow and the direct activation flow verify a claimant
//! differently:
//!
//! | Policy                     | Student              | Staff                      | Effect   |
//! |----------------------------|----------------------|----------------------------|----------|
//! | [`ReviewedClaimPolicy`]    | verification code    | cleaned name equality      | advisory |
//! | [`DirectActivationPolicy`] | verification code    | verification code required | gate     |

use crate::matching::{verification_code_matches, verify_secondary_key};
use crate::model::{ClaimType, MasterRecord};

/// Decides whether a secondary input matches a master record.
pub trait VerificationPolicy: Send + Sync {
    /// Returns `true` if `input` verifies the claimant against `record`.
    fn verify(&self, claim_type: ClaimType, record: &MasterRecord, input: &str) -> bool;

    /// Returns `true` if a failed verification must stop the operation.
    fn is_gate(&self) -> bool;

    /// Returns the policy name.
    fn name(&self) -> &'static str;
}

/// Policy for claims that an administrator reviews.
///
/// The result is stored as a hint and never blocks submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewedClaimPolicy;

impl VerificationPolicy for ReviewedClaimPolicy {
    fn verify(&self, claim_type: ClaimType, record: &MasterRecord, input: &str) -> bool {
        verify_secondary_key(claim_type, record, input)
    }

    fn is_gate(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "reviewed_claim"
    }
}

/// Policy for self-activation, which links without review.
///
/// Names are public knowledge, so staff must supply the record's unique
/// verification code. Staff records without one cannot be self-activated.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectActivationPolicy;

impl VerificationPolicy for DirectActivationPolicy {
    fn verify(&self, _claim_type: ClaimType, record: &MasterRecord, input: &str) -> bool {
        verification_code_matches(record, input)
    }

    fn is_gate(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "direct_activation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reviewed_policy_matches_staff_by_name() {
        let record = MasterRecord::new("19850101", "Dra. Siti Aminah, M.Pd").with_verification_code("X-77");
        assert!(ReviewedClaimPolicy.verify(ClaimType::Staff, &record, "siti aminah"));
        assert!(!ReviewedClaimPolicy.verify(ClaimType::Staff, &record, "X-77"));
        assert!(!ReviewedClaimPolicy.is_gate());
    }

    #[test]
    fn test_direct_policy_requires_code() {
        let record = MasterRecord::new("19850101", "Dra. Siti Aminah, M.Pd").with_verification_code("X-77");
        assert!(DirectActivationPolicy.verify(ClaimType::Staff, &record, "X-77"));
        assert!(!DirectActivationPolicy.verify(ClaimType::Staff, &record, "siti aminah"));
        assert!(DirectActivationPolicy.is_gate());

        let no_code = MasterRecord::new("19850101", "Siti Aminah");
        assert!(!DirectActivationPolicy.verify(ClaimType::Staff, &no_code, "siti aminah"));
        assert!(!DirectActivationPolicy.verify(ClaimType::Staff, &no_code, ""));
    }

    #[test]
    fn test_policies_agree_on_students() {
        let record = MasterRecord::new("1234567890", "Budi").with_verification_code("9999");
        for input in ["9999", " 9999", "0000", ""] {
            assert_eq!(
                ReviewedClaimPolicy.verify(ClaimType::Student, &record, input),
                DirectActivationPolicy.verify(ClaimType::Student, &record, input),
            );
        }
    }
}
