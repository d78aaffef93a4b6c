use axum::{Json, extract::State, http::StatusCode};
use lectern_core::{AppError, ErrorResponse};
use lectern_models::{ChangePasswordRequest, StatusResponse, UpdateProfileRequest, UserResponse};
use tracing::instrument;

use crate::middleware::auth::Identity;
use crate::modules::users::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// The caller's own user record
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::get_user_response(&state.db, identity.user_id).await?;
    Ok(Json(user))
}

/// Replace the caller's profile
#[utoipa::path(
    put,
    path = "/api/me/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "A field is too long", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
#[instrument(skip(state, request))]
pub async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserService::update_profile(&state.db, identity.user_id, &request).await?;
    Ok(Json(user))
}

/// Delete the caller's account
#[utoipa::path(
    delete,
    path = "/api/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state.db, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/api/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = StatusResponse),
        (status = 400, description = "Current password is wrong or new password too short", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
#[instrument(skip(state, request))]
pub async fn change_password(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    UserService::change_password(&state.db, identity.user_id, request).await?;
    Ok(Json(StatusResponse::ok()))
}

/// Heartbeat; records the caller as seen now
#[utoipa::path(
    post,
    path = "/api/me/ping",
    responses(
        (status = 200, description = "Recorded", body = StatusResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
#[instrument(skip(state))]
pub async fn ping(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<StatusResponse>, AppError> {
    UserService::touch_last_seen(&state.db, identity.user_id).await?;
    Ok(Json(StatusResponse::ok()))
}
