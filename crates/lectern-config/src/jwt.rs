//! Token signing configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `JWT_SECRET` | required |
//! | `JWT_ISSUER` | `lectern` |
//! | `ACCESS_TTL_SECONDS` | `14400` (4 hours), at most 1 day |
//! | `REFRESH_TTL_SECONDS` | `1209600` (14 days), at most 365 days |
//!
//! Lifetimes that are not positive fall back to the default; lifetimes above
//! the maximum are capped.

use crate::{ConfigError, env};

pub const DEFAULT_ISSUER: &str = "lectern";
pub const DEFAULT_ACCESS_TTL: i64 = 14_400;
pub const DEFAULT_REFRESH_TTL: i64 = 1_209_600;
pub const MAX_ACCESS_TTL: i64 = 86_400;
pub const MAX_REFRESH_TTL: i64 = 365 * 86_400;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_expiry: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env::process_env)
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = env::required(&get, "JWT_SECRET")?;
        let issuer = env::lookup(&get, "JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        let access_token_expiry = positive(env::parse_or(
            &get,
            "ACCESS_TTL_SECONDS",
            DEFAULT_ACCESS_TTL,
        ))
        .unwrap_or(DEFAULT_ACCESS_TTL)
        .min(MAX_ACCESS_TTL);
        let refresh_token_expiry = positive(env::parse_or(
            &get,
            "REFRESH_TTL_SECONDS",
            DEFAULT_REFRESH_TTL,
        ))
        .unwrap_or(DEFAULT_REFRESH_TTL)
        .min(MAX_REFRESH_TTL);

        Ok(Self {
            secret,
            issuer,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

fn positive(v: i64) -> Option<i64> {
    (v > 0).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::from_pairs;

    #[test]
    fn test_missing_secret_is_error() {
        let result = JwtConfig::from_lookup(from_pairs(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_blank_secret_is_error() {
        let result = JwtConfig::from_lookup(from_pairs(&[("JWT_SECRET", "   ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = JwtConfig::from_lookup(from_pairs(&[("JWT_SECRET", "abc")])).unwrap();
        assert_eq!(config.secret, "abc");
        assert_eq!(config.issuer, "lectern");
        assert_eq!(config.access_token_expiry, 14_400);
        assert_eq!(config.refresh_token_expiry, 1_209_600);
    }

    #[test]
    fn test_overrides() {
        let config = JwtConfig::from_lookup(from_pairs(&[
            ("JWT_SECRET", "abc"),
            ("JWT_ISSUER", "campus"),
            ("ACCESS_TTL_SECONDS", "60"),
            ("REFRESH_TTL_SECONDS", "120"),
        ]))
        .unwrap();
        assert_eq!(config.issuer, "campus");
        assert_eq!(config.access_token_expiry, 60);
        assert_eq!(config.refresh_token_expiry, 120);
    }

    #[test]
    fn test_non_positive_ttl_uses_default() {
        let config = JwtConfig::from_lookup(from_pairs(&[
            ("JWT_SECRET", "abc"),
            ("ACCESS_TTL_SECONDS", "0"),
            ("REFRESH_TTL_SECONDS", "-5"),
        ]))
        .unwrap();
        assert_eq!(config.access_token_expiry, DEFAULT_ACCESS_TTL);
        assert_eq!(config.refresh_token_expiry, DEFAULT_REFRESH_TTL);
    }

    #[test]
    fn test_huge_ttl_is_capped() {
        let config = JwtConfig::from_lookup(from_pairs(&[
            ("JWT_SECRET", "abc"),
            ("ACCESS_TTL_SECONDS", "9223372036854775807"),
            ("REFRESH_TTL_SECONDS", "99999999999"),
        ]))
        .unwrap();
        assert_eq!(config.access_token_expiry, MAX_ACCESS_TTL);
        assert_eq!(config.refresh_token_expiry, MAX_REFRESH_TTL);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::from_lookup(from_pairs(&[("JWT_SECRET", "topsecret")])).unwrap();
        assert!(!format!("{config:?}").contains("topsecret"));
    }
}
