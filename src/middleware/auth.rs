//! Bearer token authentication.
//!
//! [`require_auth`] is layered onto every protected router. It resolves the
//! `Authorization: Bearer <token>` header to an [`Identity`] and stores it in
//! the request extensions, where handlers pick it up with the [`Identity`]
//! extractor and role gates read it before the handler runs.

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use lectern_auth::{AccessClaims, TokenService};
use lectern_core::AppError;
use uuid::Uuid;

use crate::state::AppState;

/// The authenticated caller, derived from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// ASCII case-insensitive.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_ref()))
    }
}

impl From<AccessClaims> for Identity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized(anyhow!("No identity on request")))
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized(anyhow!("Missing authorization header")))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized(anyhow!("Invalid authorization header format")))
}

/// Verifies `raw` and insists on an access token.
pub fn authenticate(tokens: &TokenService, raw: &str) -> Result<Identity, AppError> {
    tokens
        .parse_token(raw)
        .and_then(|claims| claims.expect_access())
        .map(Identity::from)
        .map_err(|e| e.into_app_error())
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = {
        let token = bearer_token(req.headers())?;
        authenticate(&state.tokens, token)?
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
