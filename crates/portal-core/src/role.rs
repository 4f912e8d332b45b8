// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Canonical role model.
//!
//! Every role string that enters the system (stored profiles, session tokens,
//! federated identity claims, admin input) goes through [`normalize_role`].
//! Nothing else in the workspace matches on raw role strings.
//!
//! # Example
//!
//! ```
//! use portal_core::role::{normalize_role, Role};
//!
//! assert_eq!(normalize_role("gtk", Role::Guest), Role::Teacher);
//! assert_eq!(normalize_role("not-a-role", Role::Guest), Role::Guest);
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Role
// =============================================================================

/// Closed set of portal roles.
///
/// The wire and storage form is the uppercase code returned by [`Role::code`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Portal administrator.
    Admin,
    /// Platform developer.
    Developer,
    /// Teacher or other educational staff.
    Teacher,
    /// Enrolled student.
    Student,
    /// Parent or guardian.
    Parent,
    /// Student class representative.
    ClassRepresentative,
    /// Homeroom teacher.
    HomeroomTeacher,
    /// Guidance counselor.
    Counselor,
    /// Deputy head for curriculum.
    CurriculumDeputy,
    /// Deputy head for student affairs.
    StudentAffairsDeputy,
    /// Deputy head for facilities.
    FacilitiesDeputy,
    /// Headmaster.
    Headmaster,
    /// Registrar / administrative office staff.
    RegistrarStaff,
    /// School data operator.
    Operator,
    /// Duty officer (daily picket teacher).
    DutyOfficer,
    /// Unlinked account with no privileges.
    #[default]
    Guest,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 16] = [
        Role::Admin,
        Role::Developer,
        Role::Teacher,
        Role::Student,
        Role::Parent,
        Role::ClassRepresentative,
        Role::HomeroomTeacher,
        Role::Counselor,
        Role::CurriculumDeputy,
        Role::StudentAffairsDeputy,
        Role::FacilitiesDeputy,
        Role::Headmaster,
        Role::RegistrarStaff,
        Role::Operator,
        Role::DutyOfficer,
        Role::Guest,
    ];

    /// Returns the canonical storage code.
    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Developer => "DEVELOPER",
            Role::Teacher => "GURU",
            Role::Student => "SISWA",
            Role::Parent => "ORANG_TUA",
            Role::ClassRepresentative => "KETUA_KELAS",
            Role::HomeroomTeacher => "WALI_KELAS",
            Role::Counselor => "GURU_BK",
            Role::CurriculumDeputy => "WAKA_KURIKULUM",
            Role::StudentAffairsDeputy => "WAKA_KESISWAAN",
            Role::FacilitiesDeputy => "WAKA_SARPRAS",
            Role::Headmaster => "KEPALA_SEKOLAH",
            Role::RegistrarStaff => "STAF_TU",
            Role::Operator => "OPERATOR",
            Role::DutyOfficer => "GURU_PIKET",
            Role::Guest => "GUEST",
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Developer => "Developer",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
            Role::Parent => "Parent",
            Role::ClassRepresentative => "Class Representative",
            Role::HomeroomTeacher => "Homeroom Teacher",
            Role::Counselor => "Counselor",
            Role::CurriculumDeputy => "Curriculum Deputy",
            Role::StudentAffairsDeputy => "Student Affairs Deputy",
            Role::FacilitiesDeputy => "Facilities Deputy",
            Role::Headmaster => "Headmaster",
            Role::RegistrarStaff => "Registrar Staff",
            Role::Operator => "Operator",
            Role::DutyOfficer => "Duty Officer",
            Role::Guest => "Guest",
        }
    }

    /// Returns the ranking weight of this role.
    ///
    /// Used for display ordering only. Access decisions go through
    /// [`crate::permission::permissions_of`].
    pub fn hierarchy(&self) -> u8 {
        hierarchy_of(*self)
    }

    /// Parses a role, returning `None` for unknown input.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' | '.' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        match key.as_str() {
            "ADMIN" | "ADMINISTRATOR" | "SUPERADMIN" => Some(Role::Admin),
            "DEVELOPER" | "DEV" => Some(Role::Developer),
            "GURU" | "TEACHER" | "GTK" | "STAFF" | "PENDIDIK" => Some(Role::Teacher),
            "SISWA" | "STUDENT" | "MURID" => Some(Role::Student),
            "ORANG_TUA" | "ORANGTUA" | "PARENT" | "WALI" | "WALI_MURID" => Some(Role::Parent),
            "KETUA_KELAS" | "CLASS_REPRESENTATIVE" | "CLASS_REP" => {
                Some(Role::ClassRepresentative)
            }
            "WALI_KELAS" | "HOMEROOM_TEACHER" | "HOMEROOM" => Some(Role::HomeroomTeacher),
            "GURU_BK" | "BK" | "COUNSELOR" | "COUNSELLOR" => Some(Role::Counselor),
            "WAKA_KURIKULUM" | "CURRICULUM_DEPUTY" => Some(Role::CurriculumDeputy),
            "WAKA_KESISWAAN" | "STUDENT_AFFAIRS_DEPUTY" => Some(Role::StudentAffairsDeputy),
            "WAKA_SARPRAS" | "FACILITIES_DEPUTY" => Some(Role::FacilitiesDeputy),
            "KEPALA_SEKOLAH" | "KEPSEK" | "HEADMASTER" | "PRINCIPAL" => Some(Role::Headmaster),
            "STAF_TU" | "TU" | "TATA_USAHA" | "REGISTRAR_STAFF" | "REGISTRAR" => {
                Some(Role::RegistrarStaff)
            }
            "OPERATOR" => Some(Role::Operator),
            "GURU_PIKET" | "PIKET" | "DUTY_OFFICER" => Some(Role::DutyOfficer),
            "GUEST" | "TAMU" => Some(Role::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Role {
    /// Stored documents may carry legacy or unknown strings, so decoding is
    /// total: anything unrecognised becomes [`Role::Guest`].
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(normalize_value(&value, Role::Guest))
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Maps an arbitrary role string to a canonical role.
///
/// Never fails: unrecognised input yields `fallback`.
pub fn normalize_role(input: &str, fallback: Role) -> Role {
    Role::parse(input).unwrap_or(fallback)
}

/// Maps an optional role string, as found in external claims, to a role.
pub fn normalize_role_opt(input: Option<&str>, fallback: Role) -> Role {
    input.map_or(fallback, |s| normalize_role(s, fallback))
}

/// Maps a JSON value to a role; non-string values yield `fallback`.
pub fn normalize_value(value: &serde_json::Value, fallback: Role) -> Role {
    match value {
        serde_json::Value::String(s) => normalize_role(s, fallback),
        _ => fallback,
    }
}

/// Returns the ranking weight of a role.
pub fn hierarchy_of(role: Role) -> u8 {
    match role {
        Role::Developer => 100,
        Role::Admin => 90,
        Role::Headmaster => 80,
        Role::CurriculumDeputy | Role::StudentAffairsDeputy | Role::FacilitiesDeputy => 70,
        Role::Operator => 60,
        Role::HomeroomTeacher | Role::Counselor => 50,
        Role::DutyOfficer => 45,
        Role::Teacher | Role::RegistrarStaff => 40,
        Role::ClassRepresentative => 20,
        Role::Student | Role::Parent => 10,
        Role::Guest => 0,
    }
}

// =============================================================================
// Tests
// =============================================================================
