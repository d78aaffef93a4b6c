//! Built-in role codes.
//!
//! The `roles` table is open to extension, but these three are seeded by
//! the first migration and every role-aware feature assumes they exist.
//! Each one is mirrored into a system group named `Role: <CODE>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleCode {
    Admin,
    Teacher,
    Student,
}

impl RoleCode {
    pub const ALL: [RoleCode; 3] = [RoleCode::Admin, RoleCode::Teacher, RoleCode::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCode::Admin => "ADMIN",
            RoleCode::Teacher => "TEACHER",
            RoleCode::Student => "STUDENT",
        }
    }

    pub fn role_group_name(&self) -> String {
        role_group_name(self.as_str())
    }
}

/// Name of the system group mirroring `code`.
pub fn role_group_name(code: &str) -> String {
    format!("Role: {}", code.to_ascii_uppercase())
}

pub fn role_group_description(code: &str) -> String {
    format!(
        "System generated group for role {}",
        code.to_ascii_uppercase()
    )
}

impl fmt::Display for RoleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for RoleCode {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        RoleCode::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseRoleError(trimmed.to_string()))
    }
}
