//! # Lectern Auth
//!
//! Token issuance and verification for the Lectern API.
//!
//! - [`claims`]: the wire claim set and the typed [`TokenClaims`] it decodes into
//! - [`jwt`]: [`TokenService`], which signs and verifies HS256 tokens
//!
//! # Token Types
//!
//! - **Access token**: `{iss, sub, typ: "access", email, roles, iat, exp}`,
//!   presented as `Authorization: Bearer <token>`
//! - **Refresh token**: `{iss, sub, typ: "refresh", iat, exp}`, exchanged at
//!   `/api/auth/refresh`; carries no roles
//!
//! Tokens are stateless. Expiry is the only way a token stops working.
//!
//! # Example
//!
//! ```ignore
//! use lectern_auth::TokenService;
//! use lectern_config::JwtConfig;
//!
//! let tokens = TokenService::new(&JwtConfig::from_env()?);
//! let (access, expires_at) = tokens.create_access_token(user_id, "a@b.c", &roles)?;
//! let claims = tokens.parse_token(&access)?.expect_access()?;
//! ```

pub mod claims;
pub mod error;
pub mod jwt;

pub use claims::{AccessClaims, RefreshClaims, TokenClaims, TokenType};
pub use error::TokenError;
pub use jwt::TokenService;
