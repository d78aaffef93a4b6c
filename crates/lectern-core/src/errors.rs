//! Application error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, AppError>`. The status code decides how
//! much of the underlying cause reaches the client:
//!
//! | Status | Body | Cause |
//! |--------|------|-------|
//! | 400 | the error message | returned verbatim |
//! | 401 | `Authentication failed` | logged at `debug` |
//! | 403 | `Not allowed` | logged at `debug` |
//! | 5xx | `Internal server error` | logged at `error` |
//!
//! Authentication failures never say *why* they failed, so a caller cannot
//! tell a missing token from an expired one or an unknown email from a wrong
//! password.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
pub const NOT_ALLOWED: &str = "Not allowed";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::FORBIDDEN, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    /// The message the client will see for this error.
    pub fn public_message(&self) -> String {
        match self.status {
            StatusCode::UNAUTHORIZED => AUTHENTICATION_FAILED.to_string(),
            StatusCode::FORBIDDEN => NOT_ALLOWED.to_string(),
            status if status.is_server_error() => INTERNAL_SERVER_ERROR.to_string(),
            _ => self.error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = ?self.error, "Request failed");
        } else if matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::debug!(status = %self.status.as_u16(), cause = %self.error, "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.public_message(),
        });

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
