use axum::Json;
use lectern_core::ErrorResponse;
use lectern_models::IdentityResponse;

use crate::middleware::auth::Identity;

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
            roles: identity.roles,
        }
    }
}

/// Reachable by teachers and admins
#[utoipa::path(
    get,
    path = "/api/teacher/ping",
    responses(
        (status = 200, description = "Caller identity", body = IdentityResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is neither teacher nor admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Areas"
)]
pub async fn teacher_ping(identity: Identity) -> Json<IdentityResponse> {
    Json(identity.into())
}

/// Reachable by students
#[utoipa::path(
    get,
    path = "/api/student/ping",
    responses(
        (status = 200, description = "Caller identity", body = IdentityResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a student", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Areas"
)]
pub async fn student_ping(identity: Identity) -> Json<IdentityResponse> {
    Json(identity.into())
}
