//! Token claim structures.
//!
//! Tokens are encoded from and decoded into [`WireClaims`], a flat claim set
//! that mirrors the JWT payload. Immediately after signature verification
//! the wire form is converted into [`TokenClaims`], which is tagged by
//! `typ` and carries only the fields valid for that kind of token.

use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::TokenError;

/// The `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT payload as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireClaims {
    pub iss: String,
    pub sub: String,
    pub typ: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Anything other than a list decodes as empty; non-string entries are skipped.
    #[serde(
        default,
        deserialize_with = "lenient_roles",
        skip_serializing_if = "Option::is_none"
    )]
    pub roles: Option<Vec<String>>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoleEntry {
    Code(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RolesClaim {
    List(Vec<RoleEntry>),
    Other(IgnoredAny),
}

fn lenient_roles<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let roles = match RolesClaim::deserialize(deserializer)? {
        RolesClaim::List(entries) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                RoleEntry::Code(code) => Some(code),
                RoleEntry::Other(_) => None,
            })
            .collect(),
        RolesClaim::Other(_) => Vec::new(),
    };
    Ok(Some(roles))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub user_id: Uuid,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// A verified token, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClaims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl TokenClaims {
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenClaims::Access(_) => TokenType::Access,
            TokenClaims::Refresh(_) => TokenType::Refresh,
        }
    }

    pub fn expect_access(self) -> Result<AccessClaims, TokenError> {
        match self {
            TokenClaims::Access(c) => Ok(c),
            other => Err(TokenError::WrongType {
                expected: TokenType::Access,
                found: other.token_type(),
            }),
        }
    }

    pub fn expect_refresh(self) -> Result<RefreshClaims, TokenError> {
        match self {
            TokenClaims::Refresh(c) => Ok(c),
            other => Err(TokenError::WrongType {
                expected: TokenType::Refresh,
                found: other.token_type(),
            }),
        }
    }
}

impl TryFrom<WireClaims> for TokenClaims {
    type Error = TokenError;

    fn try_from(wire: WireClaims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&wire.sub)
            .map_err(|_| TokenError::Malformed(format!("sub is not a user id: {}", wire.sub)))?;

        match wire.typ {
            TokenType::Access => {
                let email = wire
                    .email
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| TokenError::Malformed("access token without email".into()))?;
                Ok(TokenClaims::Access(AccessClaims {
                    user_id,
                    email,
                    roles: wire.roles.unwrap_or_default(),
                    issued_at: wire.iat,
                    expires_at: wire.exp,
                }))
            }
            TokenType::Refresh => Ok(TokenClaims::Refresh(RefreshClaims {
                user_id,
                issued_at: wire.iat,
                expires_at: wire.exp,
            })),
        }
    }
}
