//! Operations behind the `lectern-cli` binary.

use anyhow::anyhow;
use lectern_core::AppError;
use lectern_models::{RoleCode, UserStatus, normalize_email};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::modules::role_groups::RoleGroupService;
use crate::modules::users::service::{NewProfile, UserService, hash_password_blocking};

/// Creates an active ADMIN account and its role-group membership.
pub async fn create_admin(db: &PgPool, email: &str, password: &str) -> Result<Uuid, AppError> {
    let email = normalize_email(email);
    if email.is_empty() || password.trim().is_empty() {
        return Err(AppError::bad_request(anyhow!("Email and password are required")));
    }
    if UserService::email_exists(db, &email).await? {
        return Err(AppError::bad_request(anyhow!("User already exists")));
    }

    let password_hash = hash_password_blocking(password.to_string()).await?;

    let mut tx = db.begin().await?;
    let user_id = UserService::insert_user(
        &mut tx,
        &email,
        &password_hash,
        UserStatus::Active,
        &NewProfile::default(),
    )
    .await?;
    UserService::grant_role(&mut tx, user_id, RoleCode::Admin).await?;
    tx.commit().await?;

    RoleGroupService::ensure_membership(db, user_id, RoleCode::Admin.as_str()).await?;

    info!(%user_id, "Admin created");
    Ok(user_id)
}

/// Mirrors every user's roles into role groups. Returns the number of users visited.
pub async fn sync_memberships(db: &PgPool) -> Result<usize, AppError> {
    RoleGroupService::ensure_role_groups(db).await?;

    let user_ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users ORDER BY created_at")
        .fetch_all(db)
        .await?;

    for user_id in &user_ids {
        RoleGroupService::ensure_user_memberships(db, *user_id).await?;
    }
    Ok(user_ids.len())
}
