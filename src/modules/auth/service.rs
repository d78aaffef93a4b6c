use anyhow::anyhow;
use lectern_auth::TokenService;
use lectern_core::{AppError, UNKNOWN_USER_CREDENTIAL, needs_rehash};
use lectern_models::{
    LoginRequest, RegisterRequest, RegisterResponse, RoleCode, TokenResponse, User, UserStatus,
    normalize_email,
};
use lectern_observability::{LoginOutcome, track_login, track_token_issued};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::modules::role_groups::RoleGroupService;
use crate::modules::users::service::{
    NewProfile, UserService, hash_password_blocking, verify_password_blocking,
};

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, request), fields(email = %request.email))]
    pub async fn register(
        db: &PgPool,
        request: RegisterRequest,
    ) -> Result<RegisterResponse, AppError> {
        if let Some(confirm) = &request.confirm_password
            && confirm != &request.password
        {
            return Err(AppError::bad_request(anyhow!(
                "Password confirmation does not match"
            )));
        }

        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(AppError::bad_request(anyhow!("Email and password are required")));
        }

        if UserService::email_exists(db, &email).await? {
            return Err(AppError::bad_request(anyhow!("User already exists")));
        }

        let password_hash = hash_password_blocking(request.password.clone()).await?;

        let profile = NewProfile {
            first_name: non_blank(&request.first_name),
            last_name: non_blank(&request.last_name),
            phone: non_blank(&request.phone),
            school: non_blank(&request.school),
            grade_level: non_blank(&request.grade_level),
        };

        let mut tx = db.begin().await?;
        let user_id =
            UserService::insert_user(&mut tx, &email, &password_hash, UserStatus::Active, &profile)
                .await?;
        UserService::grant_role(&mut tx, user_id, RoleCode::Student).await?;
        tx.commit().await?;

        RoleGroupService::ensure_membership(db, user_id, RoleCode::Student.as_str()).await?;

        info!(%user_id, "User registered");
        Ok(RegisterResponse { user_id, email })
    }

    /// Verifies credentials and issues a token pair.
    ///
    /// An unknown email and a wrong password are the same 401. A correct
    /// password on an account that is not `ACTIVE` is a 403.
    #[instrument(skip(db, tokens, request), fields(email = %request.email))]
    pub async fn login(
        db: &PgPool,
        tokens: &TokenService,
        request: LoginRequest,
    ) -> Result<TokenResponse, AppError> {
        let Some(user) = UserService::find_by_email(db, &request.email).await? else {
            verify_password_blocking(request.password, UNKNOWN_USER_CREDENTIAL.to_string()).await?;
            track_login(LoginOutcome::Failure);
            return Err(AppError::unauthorized(anyhow!("Unknown email")));
        };

        let valid =
            verify_password_blocking(request.password.clone(), user.password_hash.clone()).await?;
        if !valid {
            track_login(LoginOutcome::Failure);
            return Err(AppError::unauthorized(anyhow!("Wrong password for {}", user.id)));
        }

        if !user.status().is_active() {
            track_login(LoginOutcome::Forbidden);
            return Err(AppError::forbidden(anyhow!(
                "User {} is {}",
                user.id,
                user.status()
            )));
        }

        if needs_rehash(&user.password_hash) {
            Self::upgrade_credential(db, &user, request.password).await;
        }

        UserService::record_login(db, user.id).await?;
        track_login(LoginOutcome::Success);

        Self::issue_tokens(db, tokens, &user).await
    }

    /// Exchanges a refresh token for a new pair. The presented token stays
    /// valid until it expires.
    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        tokens: &TokenService,
        refresh_token: &str,
    ) -> Result<TokenResponse, AppError> {
        let claims = tokens
            .parse_token(refresh_token)
            .and_then(|claims| claims.expect_refresh())
            .map_err(|e| e.into_app_error())?;

        let user = UserService::find_by_id(db, claims.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized(anyhow!("Refresh for unknown user")))?;

        if !user.status().is_active() {
            return Err(AppError::forbidden(anyhow!(
                "User {} is {}",
                user.id,
                user.status()
            )));
        }

        Self::issue_tokens(db, tokens, &user).await
    }

    async fn issue_tokens(
        db: &PgPool,
        tokens: &TokenService,
        user: &User,
    ) -> Result<TokenResponse, AppError> {
        let roles = UserService::fetch_roles(db, user.id).await?;

        let (access_token, expires_at) = tokens.create_access_token(user.id, &user.email, &roles)?;
        track_token_issued("access");
        let refresh_token = tokens.create_refresh_token(user.id)?;
        track_token_issued("refresh");

        let user = UserService::get_user_response(db, user.id).await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            expires_at,
            user,
        })
    }

    /// Re-hashes a legacy credential. Failure is logged and ignored.
    async fn upgrade_credential(db: &PgPool, user: &User, password: String) {
        let result = match hash_password_blocking(password).await {
            Ok(hash) => UserService::set_password_hash(db, user.id, &hash).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!(user_id = %user.id, "Upgraded legacy credential"),
            Err(e) => warn!(user_id = %user.id, error = ?e.error, "Credential upgrade failed"),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
