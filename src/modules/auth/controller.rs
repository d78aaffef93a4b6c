use axum::{Json, extract::State, http::StatusCode};
use lectern_core::{AppError, ErrorResponse};
use lectern_models::{
    LoginRequest, RefreshTokenRequest, RegisterRequest, RegisterResponse, StatusResponse,
    TokenResponse,
};
use tracing::instrument;

use super::service::AuthService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register a new student account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Validation error, password mismatch or email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let response = AuthService::register(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account is not active", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = AuthService::login(&state.db, &state.tokens, request).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Invalid, expired or non-refresh token", body = ErrorResponse),
        (status = 403, description = "Account is not active", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, request))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = AuthService::refresh(&state.db, &state.tokens, &request.refresh_token).await?;
    Ok(Json(response))
}

/// Logout. Tokens are stateless, so this only acknowledges.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Acknowledged", body = StatusResponse)),
    tag = "Authentication"
)]
pub async fn logout() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
