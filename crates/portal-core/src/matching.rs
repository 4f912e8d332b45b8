// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identity matching engine.
//!
//! Resolves a claimed institution identifier to an available master record
//! and compares the claimant's secondary input against it. A record that has
//! already been claimed is reported exactly like an absent one.
//!
//! # Example
//!
//! ```
//! use portal_core::matching::clean_academic_name;
//!
//! assert_eq!(clean_academic_name("Drs. Ahmad Fauzi, S.Pd., M.Pd"), "ahmad fauzi");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreResult;
use crate::model::{ClaimType, MasterRecord};
use crate::store::Repository;

// =============================================================================
// Rules
// =============================================================================

/// Default minimum student identifier length (NISN).
pub const DEFAULT_STUDENT_MIN_LENGTH: usize = 10;

/// Default minimum staff identifier length (NIP/NUPTK).
pub const DEFAULT_STAFF_MIN_LENGTH: usize = 8;

/// Input length thresholds below which no lookup is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingRules {
    /// Minimum student identifier length.
    pub student_min_length: usize,
    /// Minimum staff identifier length.
    pub staff_min_length: usize,
}

impl Default for MatchingRules {
    fn default() -> Self {
        Self {
            student_min_length: DEFAULT_STUDENT_MIN_LENGTH,
            staff_min_length: DEFAULT_STAFF_MIN_LENGTH,
        }
    }
}

impl MatchingRules {
    /// Returns the threshold for a claim type.
    pub fn min_length(&self, claim_type: ClaimType) -> usize {
        match claim_type {
            ClaimType::Student => self.student_min_length,
            ClaimType::Staff => self.staff_min_length,
        }
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// Looks up unclaimed master records.
#[derive(Clone)]
pub struct IdentityMatcher {
    repo: Repository,
    rules: MatchingRules,
}

impl IdentityMatcher {
    /// Creates a matcher with default rules.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            rules: MatchingRules::default(),
        }
    }

    /// Sets the length thresholds.
    pub fn with_rules(mut self, rules: MatchingRules) -> Self {
        self.rules = rules;
        self
    }

    /// Returns the active rules.
    pub fn rules(&self) -> &MatchingRules {
        &self.rules
    }

    /// Returns the available record for `primary_key`, if any.
    ///
    /// Input shorter than the type's threshold returns `None` without
    /// touching the store. Claimed records return `None`.
    pub async fn lookup_master(
        &self,
        claim_type: ClaimType,
        primary_key: &str,
    ) -> CoreResult<Option<MasterRecord>> {
        let key = primary_key.trim();
        if key.chars().count() < self.rules.min_length(claim_type) {
            return Ok(None);
        }

        let record = self.repo.get_master(claim_type, key).await?;
        match record {
            Some(record) if !record.claimed => Ok(Some(record)),
            Some(_) => {
                debug!(claim_type = %claim_type, "Lookup hit a claimed record");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

// =============================================================================
// Name Cleaning
// =============================================================================

/// Title tokens that may precede a name, compared without periods.
const PREFIX_TITLES: &[&str] = &[
    "prof", "dr", "drs", "dra", "ir", "h", "hj", "kh", "ust", "ustadz", "ustadzah",
];

/// Degree tokens that may trail a name without a comma, compared without periods.
const DEGREE_SUFFIXES: &[&str] = &[
    "spd", "mpd", "spdi", "mpdi", "skom", "mkom", "ssi", "msi", "se", "mm", "sh", "mh", "sag",
    "mag", "ssos", "msos", "st", "mt", "sip", "skm", "spsi", "mpsi", "shum", "mhum", "sn", "lc",
    "ma", "mba", "phd", "amd", "sst", "sthi", "shi",
];

fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .flat_map(char::to_lowercase)
        .collect()
}

fn looks_like_degree(raw: &str, normalized: &str) -> bool {
    if DEGREE_SUFFIXES.contains(&normalized) {
        return true;
    }
    let mut parts = raw.split('.').filter(|p| !p.is_empty());
    match (parts.next(), parts.next()) {
        (Some(head), Some(_)) => head.len() <= 2 && head.chars().all(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// Strips academic titles and degrees, then lower-cases the result.
///
/// Total and idempotent. The last remaining token is never stripped, so a
/// name made only of title-like tokens keeps one of them.
pub fn clean_academic_name(name: &str) -> String {
    let head = name.split(',').next().unwrap_or_default();

    let mut tokens: Vec<(&str, String)> = head
        .split_whitespace()
        .map(|raw| (raw, normalize_token(raw)))
        .filter(|(_, normalized)| !normalized.is_empty())
        .collect();

    let leading = tokens
        .iter()
        .take(tokens.len().saturating_sub(1))
        .take_while(|(_, n)| PREFIX_TITLES.contains(&n.as_str()))
        .count();
    tokens.drain(..leading);

    while tokens.len() > 1 {
        match tokens.last() {
            Some((raw, normalized)) if looks_like_degree(raw, normalized) => {
                tokens.pop();
            }
            _ => break,
        }
    }

    tokens
        .into_iter()
        .map(|(_, normalized)| normalized)
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Secondary Key
// =============================================================================

/// Compares the claimant's secondary input against a record.
///
/// Students must match the record's verification code exactly. Staff match
/// when the cleaned names are equal.
pub fn verify_secondary_key(claim_type: ClaimType, record: &MasterRecord, input: &str) -> bool {
    match claim_type {
        ClaimType::Student => verification_code_matches(record, input),
        ClaimType::Staff => {
            let cleaned = clean_academic_name(input);
            !cleaned.is_empty() && cleaned == clean_academic_name(&record.name)
        }
    }
}

/// Exact, trimmed comparison against the record's verification code.
pub fn verification_code_matches(record: &MasterRecord, input: &str) -> bool {
    let input = input.trim();
    !input.is_empty() && record.verification_code.as_deref().map(str::trim) == Some(input)
}

// =============================================================================
// Tests
// =============================================================================
