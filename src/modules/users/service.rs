use anyhow::anyhow;
use lectern_core::{AppError, hash_password, verify_password};
use lectern_models::{
    ChangePasswordRequest, CreateUserRequest, ProfileResponse, RoleCode, UpdateProfileRequest,
    UpdateUserRequest, User, UserResponse, UserStatus, normalize_email,
};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::modules::role_groups::RoleGroupService;

const USER_COLUMNS: &str = "id, email, password_hash, status, created_at, updated_at, last_login_at, last_seen_at";

#[derive(sqlx::FromRow)]
struct ProfileRow {
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    school: Option<String>,
    grade_level: Option<String>,
}

impl From<ProfileRow> for ProfileResponse {
    fn from(row: ProfileRow) -> Self {
        Self {
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            school: row.school,
            grade_level: row.grade_level,
        }
    }
}

/// Fields of an optional profile row.
#[derive(Debug, Default)]
pub struct NewProfile<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub school: Option<&'a str>,
    pub grade_level: Option<&'a str>,
}

/// Trimmed value, or `None` when blank.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl<'a> From<&'a UpdateProfileRequest> for NewProfile<'a> {
    fn from(request: &'a UpdateProfileRequest) -> Self {
        Self {
            first_name: non_blank(&request.first_name),
            last_name: non_blank(&request.last_name),
            phone: non_blank(&request.phone),
            school: non_blank(&request.school),
            grade_level: non_blank(&request.grade_level),
        }
    }
}

impl<'a> From<&'a UpdateUserRequest> for NewProfile<'a> {
    fn from(request: &'a UpdateUserRequest) -> Self {
        Self {
            first_name: non_blank(&request.first_name),
            last_name: non_blank(&request.last_name),
            phone: non_blank(&request.phone),
            school: non_blank(&request.school),
            grade_level: non_blank(&request.grade_level),
        }
    }
}

impl NewProfile<'_> {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.school.is_none()
            && self.grade_level.is_none()
    }
}

/// Hashes off the async executor; Argon2id at 64 MiB is not cheap.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: String, credential: String) -> Result<bool, AppError> {
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &credential)).await?;
    Ok(ok)
}

pub fn parse_role(raw: &str) -> Result<RoleCode, AppError> {
    raw.parse::<RoleCode>().map_err(AppError::bad_request)
}

pub fn parse_status(raw: &str) -> Result<UserStatus, AppError> {
    raw.parse::<UserStatus>()
        .map_err(|msg| AppError::bad_request(anyhow!(msg)))
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn get_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        Self::find_by_id(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    pub async fn email_exists(db: &PgPool, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = $1)",
        )
        .bind(normalize_email(email))
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    /// Role codes held by `user_id`, alphabetical.
    #[instrument(skip(db))]
    pub async fn fetch_roles(db: &PgPool, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"SELECT r.code
               FROM roles r
               JOIN user_roles ur ON ur.role_id = r.id
               WHERE ur.user_id = $1
               ORDER BY r.code"#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(roles)
    }

    /// `None` when there is no profile row or every field in it is empty.
    pub async fn fetch_profile(
        db: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<ProfileResponse>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"SELECT first_name, last_name, phone, school, grade_level
               FROM user_profiles WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(row
            .map(ProfileResponse::from)
            .filter(|profile| !profile.is_empty()))
    }

    pub async fn build_response(db: &PgPool, user: &User) -> Result<UserResponse, AppError> {
        let roles = Self::fetch_roles(db, user.id).await?;
        let profile = Self::fetch_profile(db, user.id).await?;

        Ok(UserResponse {
            id: user.id,
            email: user.email.clone(),
            status: user.status().to_string(),
            role: UserResponse::primary_role(&roles),
            roles,
            profile,
            last_login_at: user.last_login_at,
        })
    }

    pub async fn get_user_response(db: &PgPool, user_id: Uuid) -> Result<UserResponse, AppError> {
        let user = Self::get_user(db, user_id).await?;
        Self::build_response(db, &user).await
    }

    #[instrument(skip(db))]
    pub async fn list_users(db: &PgPool) -> Result<Vec<UserResponse>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;

        let mut items = Vec::with_capacity(users.len());
        for user in &users {
            items.push(Self::build_response(db, user).await?);
        }
        Ok(items)
    }

    /// Inserts a user row and, when any field is set, its profile.
    pub async fn insert_user(
        conn: &mut PgConnection,
        email: &str,
        password_hash: &str,
        status: UserStatus,
        profile: &NewProfile<'_>,
    ) -> Result<Uuid, AppError> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (email, password_hash, status)
               VALUES ($1, $2, $3)
               RETURNING id"#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(status.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow!("User already exists"));
            }
            AppError::from(e)
        })?;

        if !profile.is_empty() {
            sqlx::query(
                r#"INSERT INTO user_profiles (user_id, first_name, last_name, phone, school, grade_level)
                   VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(user_id)
            .bind(profile.first_name)
            .bind(profile.last_name)
            .bind(profile.phone)
            .bind(profile.school)
            .bind(profile.grade_level)
            .execute(&mut *conn)
            .await?;
        }

        Ok(user_id)
    }

    /// Grants `role` to `user_id`. Granting a held role is a no-op.
    pub async fn grant_role(
        conn: &mut PgConnection,
        user_id: Uuid,
        role: RoleCode,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"INSERT INTO user_roles (user_id, role_id)
               SELECT $1, id FROM roles WHERE code = $2
               ON CONFLICT (user_id, role_id) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let known = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM roles WHERE code = $1)",
            )
            .bind(role.as_str())
            .fetch_one(&mut *conn)
            .await?;
            if !known {
                return Err(AppError::internal(anyhow!("Role {role} is not seeded")));
            }
        }
        Ok(())
    }

    #[instrument(skip(db, request), fields(email = %request.email))]
    pub async fn create_user(
        db: &PgPool,
        request: CreateUserRequest,
    ) -> Result<UserResponse, AppError> {
        let email = normalize_email(&request.email);

        let mut roles: Vec<RoleCode> = Vec::new();
        for raw in &request.roles {
            let role = parse_role(raw)?;
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        if roles.is_empty() {
            roles.push(RoleCode::Student);
        }

        let status = match request.status.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_status(raw)?,
            _ => UserStatus::Active,
        };

        if Self::email_exists(db, &email).await? {
            return Err(AppError::bad_request(anyhow!("User already exists")));
        }

        let password_hash = hash_password_blocking(request.password).await?;

        let mut tx = db.begin().await?;
        let user_id =
            Self::insert_user(&mut tx, &email, &password_hash, status, &NewProfile::default())
                .await?;
        for role in &roles {
            Self::grant_role(&mut tx, user_id, *role).await?;
        }
        tx.commit().await?;

        for role in &roles {
            RoleGroupService::ensure_membership(db, user_id, role.as_str()).await?;
        }

        Self::get_user_response(db, user_id).await
    }

    /// Overwrites every profile field, creating the row if needed.
    pub async fn upsert_profile(
        conn: &mut PgConnection,
        user_id: Uuid,
        profile: &NewProfile<'_>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO user_profiles (user_id, first_name, last_name, phone, school, grade_level)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (user_id) DO UPDATE SET
                   first_name = EXCLUDED.first_name,
                   last_name = EXCLUDED.last_name,
                   phone = EXCLUDED.phone,
                   school = EXCLUDED.school,
                   grade_level = EXCLUDED.grade_level,
                   updated_at = NOW()"#,
        )
        .bind(user_id)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .bind(profile.phone)
        .bind(profile.school)
        .bind(profile.grade_level)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    #[instrument(skip(db, request))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        request: &UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        Self::get_user(db, user_id).await?;

        let mut conn = db.acquire().await?;
        Self::upsert_profile(&mut conn, user_id, &NewProfile::from(request)).await?;
        drop(conn);

        Self::get_user_response(db, user_id).await
    }

    /// Replaces status, profile and role grants in one transaction, then
    /// brings role group memberships in line with the new grants.
    #[instrument(skip(db, request))]
    pub async fn update_user(
        db: &PgPool,
        user_id: Uuid,
        request: &UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        let user = Self::get_user(db, user_id).await?;

        if normalize_email(&user.email) != normalize_email(&request.email) {
            return Err(AppError::bad_request(anyhow!("Email cannot be changed")));
        }

        let mut desired: Vec<RoleCode> = Vec::new();
        for raw in &request.roles {
            let role = parse_role(raw)?;
            if !desired.contains(&role) {
                desired.push(role);
            }
        }
        if desired.is_empty() {
            desired.push(RoleCode::Student);
        }

        let status = match request.status.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_status(raw)?),
            _ => None,
        };

        let current = Self::fetch_roles(db, user_id).await?;
        let revoked: Vec<String> = current
            .into_iter()
            .filter(|code| !desired.iter().any(|role| role.as_str() == code))
            .collect();

        let mut tx = db.begin().await?;
        if let Some(status) = status {
            sqlx::query("UPDATE users SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status.as_str())
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        Self::upsert_profile(&mut tx, user_id, &NewProfile::from(request)).await?;
        for code in &revoked {
            sqlx::query(
                r#"DELETE FROM user_roles
                   WHERE user_id = $1
                     AND role_id = (SELECT id FROM roles WHERE code = $2)"#,
            )
            .bind(user_id)
            .bind(code)
            .execute(&mut *tx)
            .await?;
        }
        for role in &desired {
            Self::grant_role(&mut tx, user_id, *role).await?;
        }
        tx.commit().await?;

        for code in &revoked {
            RoleGroupService::remove_membership(db, user_id, code).await?;
        }
        for role in &desired {
            RoleGroupService::ensure_membership(db, user_id, role.as_str()).await?;
        }

        Self::get_user_response(db, user_id).await
    }

    /// Deletes the user; roles, profile and memberships cascade.
    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn update_status(
        db: &PgPool,
        user_id: Uuid,
        status: &str,
    ) -> Result<UserResponse, AppError> {
        let status = parse_status(status)?;

        let result = sqlx::query("UPDATE users SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        Self::get_user_response(db, user_id).await
    }

    #[instrument(skip(db))]
    pub async fn assign_role(
        db: &PgPool,
        user_id: Uuid,
        role: &str,
    ) -> Result<UserResponse, AppError> {
        let role = parse_role(role)?;
        Self::get_user(db, user_id).await?;

        let mut conn = db.acquire().await?;
        Self::grant_role(&mut conn, user_id, role).await?;
        drop(conn);

        RoleGroupService::ensure_membership(db, user_id, role.as_str()).await?;

        Self::get_user_response(db, user_id).await
    }

    #[instrument(skip(db))]
    pub async fn remove_role(
        db: &PgPool,
        user_id: Uuid,
        role: &str,
    ) -> Result<UserResponse, AppError> {
        let role = parse_role(role)?;
        Self::get_user(db, user_id).await?;

        sqlx::query(
            r#"DELETE FROM user_roles
               WHERE user_id = $1
                 AND role_id = (SELECT id FROM roles WHERE code = $2)"#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(db)
        .await?;

        RoleGroupService::remove_membership(db, user_id, role.as_str()).await?;

        Self::get_user_response(db, user_id).await
    }

    pub async fn record_login(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), last_seen_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn touch_last_seen(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_seen_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_password_hash(
        db: &PgPool,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    #[instrument(skip(db, request))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let user = Self::get_user(db, user_id).await?;

        if !verify_password_blocking(request.current_password, user.password_hash).await? {
            return Err(AppError::bad_request(anyhow!("Current password is incorrect")));
        }

        let password_hash = hash_password_blocking(request.new_password).await?;
        Self::set_password_hash(db, user_id, &password_hash).await
    }
}
