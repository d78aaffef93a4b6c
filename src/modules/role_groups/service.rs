//! Role groups mirror role grants as group memberships.
//!
//! Every role code owns one `SYSTEM` group named `Role: <CODE>`; every user
//! holding a role is an `ACTIVE` member of that role's group. All operations
//! check before writing and tolerate a concurrent writer, so they can be
//! re-run at any time to repair a partially applied state.

use lectern_core::AppError;
use lectern_models::{
    GroupVisibility, RoleCode,
    roles::{role_group_description, role_group_name},
};
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub struct RoleGroupService;

impl RoleGroupService {
    /// Ensures a group exists for each built-in role.
    #[instrument(skip(db))]
    pub async fn ensure_role_groups(db: &PgPool) -> Result<(), AppError> {
        for role in RoleCode::ALL {
            Self::ensure_role_group(db, role.as_str()).await?;
        }
        Ok(())
    }

    /// Returns the id of the group for `code`, creating it when missing.
    #[instrument(skip(db))]
    pub async fn ensure_role_group(db: &PgPool, code: &str) -> Result<Uuid, AppError> {
        let name = role_group_name(code);

        if let Some(id) = Self::find_group(db, &name).await? {
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO groups (name, description, visibility)
               VALUES ($1, $2, $3)
               ON CONFLICT (name) DO NOTHING
               RETURNING id"#,
        )
        .bind(&name)
        .bind(role_group_description(code))
        .bind(GroupVisibility::System.as_str())
        .fetch_optional(db)
        .await?;

        match inserted {
            Some(id) => {
                info!(group = %name, "Created role group");
                Ok(id)
            }
            // Lost a race with another writer; theirs is as good as ours.
            None => Self::find_group(db, &name).await?.ok_or_else(|| {
                AppError::internal(anyhow::anyhow!("Role group {name} vanished after insert"))
            }),
        }
    }

    /// Ensures `user_id` is a member of the group for `role_code`.
    #[instrument(skip(db))]
    pub async fn ensure_membership(
        db: &PgPool,
        user_id: Uuid,
        role_code: &str,
    ) -> Result<(), AppError> {
        let code = role_code.trim().to_ascii_uppercase();
        let group_id = Self::ensure_role_group(db, &code).await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(db)
        .await?;

        if exists {
            return Ok(());
        }

        sqlx::query(
            r#"INSERT INTO group_members (group_id, user_id, member_role, status)
               VALUES ($1, $2, $3, 'ACTIVE')
               ON CONFLICT (group_id, user_id) DO NOTHING"#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(&code)
        .execute(db)
        .await?;

        debug!(%user_id, role = %code, "Added role group membership");
        Ok(())
    }

    /// Mirrors every role `user_id` currently holds.
    #[instrument(skip(db))]
    pub async fn ensure_user_memberships(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"SELECT r.code
               FROM roles r
               JOIN user_roles ur ON ur.role_id = r.id
               WHERE ur.user_id = $1
               ORDER BY r.code"#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        for code in codes {
            Self::ensure_membership(db, user_id, &code).await?;
        }
        Ok(())
    }

    /// Drops `user_id` from the group for `role_code`. Returns whether a row went away.
    #[instrument(skip(db))]
    pub async fn remove_membership(
        db: &PgPool,
        user_id: Uuid,
        role_code: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"DELETE FROM group_members
               WHERE user_id = $1
                 AND group_id = (SELECT id FROM groups WHERE name = $2)"#,
        )
        .bind(user_id)
        .bind(role_group_name(role_code.trim()))
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_group(db: &PgPool, name: &str) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM groups WHERE name = $1")
            .bind(name)
            .fetch_optional(db)
            .await?;
        Ok(id)
    }
}
