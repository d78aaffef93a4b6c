//! Role gates.
//!
//! A gate is a [`RoleRequirement`] handed to
//! `axum::middleware::from_fn_with_state` together with [`enforce_roles`]:
//!
//! ```rust,ignore
//! use axum::{Router, middleware};
//! use crate::middleware::role::{enforce_roles, require_any_role};
//!
//! let teacher_routes = Router::new()
//!     .route("/ping", get(ping))
//!     .route_layer(middleware::from_fn_with_state(
//!         require_any_role(["TEACHER", "ADMIN"]),
//!         enforce_roles,
//!     ));
//! ```
//!
//! Gates read the [`Identity`] that `require_auth` stored, so they must sit
//! inside it. A gate that finds no identity answers 401; a gate whose
//! predicate fails answers 403. Either way the handler never runs.

use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use lectern_core::AppError;

use crate::middleware::auth::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Every listed role must be held.
    All,
    /// At least one listed role must be held.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequirement {
    roles: Vec<String>,
    mode: MatchMode,
}

impl RoleRequirement {
    pub fn is_satisfied_by(&self, identity: &Identity) -> bool {
        match self.mode {
            MatchMode::All => self.roles.iter().all(|r| identity.has_role(r)),
            MatchMode::Any => identity.has_any_role(&self.roles),
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

pub fn require_role(role: impl Into<String>) -> RoleRequirement {
    RoleRequirement {
        roles: vec![role.into()],
        mode: MatchMode::All,
    }
}

/// Passes when the caller holds at least one of `roles`. An empty list never passes.
pub fn require_any_role<I, S>(roles: I) -> RoleRequirement
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RoleRequirement {
        roles: roles.into_iter().map(Into::into).collect(),
        mode: MatchMode::Any,
    }
}

/// Checks `identity` against `requirement`, mapping a miss to 403.
pub fn check_roles(identity: &Identity, requirement: &RoleRequirement) -> Result<(), AppError> {
    if requirement.is_satisfied_by(identity) {
        Ok(())
    } else {
        Err(AppError::forbidden(anyhow!(
            "User {} lacks {:?} of {:?}",
            identity.user_id,
            requirement.mode,
            requirement.roles
        )))
    }
}

pub async fn enforce_roles(
    State(requirement): State<RoleRequirement>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::unauthorized(anyhow!("Role gate reached without identity")))?;

    check_roles(identity, &requirement)?;

    Ok(next.run(req).await)
}
