use lectern_core::AppError;
use thiserror::Error;

use crate::claims::TokenType;

/// Why a presented token was refused.
///
/// The variants exist for logs and tests. Clients only ever see
/// `Authentication failed`.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),

    #[error("token claims are malformed: {0}")]
    Malformed(String),

    #[error("expected {expected} token, got {found}")]
    WrongType {
        expected: TokenType,
        found: TokenType,
    },
}

impl TokenError {
    pub fn into_app_error(self) -> AppError {
        AppError::unauthorized(self)
    }
}
