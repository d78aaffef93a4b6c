//! HS256 token signing and verification.
//!
//! [`TokenService`] is built once from [`JwtConfig`] at startup and shared
//! read-only through application state. Verification checks, in order:
//!
//! 1. signature and algorithm (HS256 only)
//! 2. `iss` equals the configured issuer
//! 3. `exp` has not passed, with zero leeway
//! 4. the payload decodes into a well-formed [`TokenClaims`]
//!
//! [`TokenService::parse_token`] does not look at `typ`. Call
//! [`TokenClaims::expect_access`] or [`TokenClaims::expect_refresh`] for the
//! per-endpoint check.

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use lectern_config::JwtConfig;
use lectern_core::AppError;

use crate::claims::{TokenClaims, TokenType, WireClaims};
use crate::error::TokenError;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            access_ttl: config.access_token_expiry,
            refresh_ttl: config.refresh_token_expiry,
        }
    }

    /// Signs an access token. Returns the token and its `exp` as unix seconds.
    pub fn create_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        roles: &[String],
    ) -> Result<(String, i64), AppError> {
        let now = Utc::now().timestamp();
        let exp = expiry(now, self.access_ttl)?;

        let claims = WireClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            typ: TokenType::Access,
            email: Some(email.to_string()),
            roles: Some(roles.to_vec()),
            iat: now,
            exp,
        };

        let token = self.sign(&claims)?;
        Ok((token, exp))
    }

    pub fn create_refresh_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now().timestamp();

        let claims = WireClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            typ: TokenType::Refresh,
            email: None,
            roles: None,
            iat: now,
            exp: expiry(now, self.refresh_ttl)?,
        };

        self.sign(&claims)
    }

    pub fn parse_token(&self, raw: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<WireClaims>(raw, &self.decoding_key, &self.validation)?;
        TokenClaims::try_from(data.claims)
    }

    fn sign(&self, claims: &WireClaims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(anyhow!("Failed to sign {} token: {e}", claims.typ)))
    }
}

fn expiry(now: i64, ttl: i64) -> Result<i64, AppError> {
    now.checked_add(ttl)
        .ok_or_else(|| AppError::internal(anyhow!("Token lifetime {ttl}s overflows")))
}
