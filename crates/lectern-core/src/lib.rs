//! # Lectern Core
//!
//! Core types shared by every Lectern crate:
//!
//! - [`errors`]: the [`AppError`] taxonomy and its HTTP response mapping
//! - [`password`]: credential hashing with legacy bcrypt fallback
//!
//! # Example
//!
//! ```ignore
//! use lectern_core::{AppError, hash_password, verify_password};
//!
//! let credential = hash_password("correct horse")?;
//! assert!(verify_password("correct horse", &credential));
//!
//! let error = AppError::forbidden(anyhow::anyhow!("teacher role required"));
//! ```

pub mod errors;
pub mod password;

pub use errors::{AppError, ErrorResponse};
pub use password::{
    CredentialFormat, UNKNOWN_USER_CREDENTIAL, hash_password, needs_rehash, verify_password,
};
