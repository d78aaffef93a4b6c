use anyhow::anyhow;
use lectern_core::AppError;
use lectern_models::{
    CreateGroupRequest, Group, GroupMemberResponse, GroupResponse, GroupSummary, GroupVisibility,
    RoleCode, UpdateGroupRequest,
};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

const GROUP_COLUMNS: &str = "id, name, description, grade, year, visibility, created_at, updated_at";

fn duplicate_name(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::bad_request(anyhow!("A group with this name already exists"));
    }
    AppError::from(e)
}

/// Role groups follow role grants and are not edited by hand.
fn ensure_not_system(group: &Group) -> Result<(), AppError> {
    if group.is_system() {
        return Err(AppError::bad_request(anyhow!("System groups cannot be modified")));
    }
    Ok(())
}

pub struct GroupService;

impl GroupService {
    #[instrument(skip(db))]
    pub async fn find_group(db: &PgPool, group_id: Uuid) -> Result<Option<Group>, AppError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(group_id)
        .fetch_optional(db)
        .await?;
        Ok(group)
    }

    pub async fn get_group_row(db: &PgPool, group_id: Uuid) -> Result<Group, AppError> {
        Self::find_group(db, group_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Group not found")))
    }

    pub async fn fetch_members(
        db: &PgPool,
        group_id: Uuid,
    ) -> Result<Vec<GroupMemberResponse>, AppError> {
        let members = sqlx::query_as::<_, GroupMemberResponse>(
            r#"SELECT gm.user_id, u.email, gm.member_role
               FROM group_members gm
               JOIN users u ON u.id = gm.user_id
               WHERE gm.group_id = $1
               ORDER BY u.email"#,
        )
        .bind(group_id)
        .fetch_all(db)
        .await?;
        Ok(members)
    }

    pub async fn get_group(db: &PgPool, group_id: Uuid) -> Result<GroupResponse, AppError> {
        let group = Self::get_group_row(db, group_id).await?;
        let members = Self::fetch_members(db, group_id).await?;
        Ok(GroupResponse::new(group, members))
    }

    /// Every group, role groups included, with member counts.
    #[instrument(skip(db))]
    pub async fn list_groups(db: &PgPool) -> Result<Vec<GroupSummary>, AppError> {
        let groups = sqlx::query_as::<_, GroupSummary>(
            r#"SELECT g.id, g.name, g.grade, g.year, g.visibility, g.created_at,
                      COUNT(gm.id) AS member_count
               FROM groups g
               LEFT JOIN group_members gm ON gm.group_id = g.id
               GROUP BY g.id
               ORDER BY g.name"#,
        )
        .fetch_all(db)
        .await?;
        Ok(groups)
    }

    /// Groups `user_id` belongs to, by name.
    #[instrument(skip(db))]
    pub async fn list_user_groups(db: &PgPool, user_id: Uuid) -> Result<Vec<GroupResponse>, AppError> {
        let groups = sqlx::query_as::<_, Group>(
            r#"SELECT g.id, g.name, g.description, g.grade, g.year, g.visibility,
                      g.created_at, g.updated_at
               FROM groups g
               JOIN group_members gm ON gm.group_id = g.id
               WHERE gm.user_id = $1
               ORDER BY g.name"#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        let mut items = Vec::with_capacity(groups.len());
        for group in groups {
            let members = Self::fetch_members(db, group.id).await?;
            items.push(GroupResponse::new(group, members));
        }
        Ok(items)
    }

    #[instrument(skip(db, request), fields(name = %request.name))]
    pub async fn create_group(
        db: &PgPool,
        request: &CreateGroupRequest,
    ) -> Result<GroupResponse, AppError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            r#"INSERT INTO groups (name, description, grade, year, visibility)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {GROUP_COLUMNS}"#
        ))
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.grade)
        .bind(request.year)
        .bind(GroupVisibility::Private.as_str())
        .fetch_one(db)
        .await
        .map_err(duplicate_name)?;

        Ok(GroupResponse::new(group, Vec::new()))
    }

    #[instrument(skip(db, request))]
    pub async fn update_group(
        db: &PgPool,
        group_id: Uuid,
        request: &UpdateGroupRequest,
    ) -> Result<GroupResponse, AppError> {
        let existing = Self::get_group_row(db, group_id).await?;
        ensure_not_system(&existing)?;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.name);

        sqlx::query(
            r#"UPDATE groups
               SET name = $2, description = $3, grade = $4, year = $5, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(group_id)
        .bind(name)
        .bind(request.description.as_ref().or(existing.description.as_ref()))
        .bind(request.grade.or(existing.grade))
        .bind(request.year.or(existing.year))
        .execute(db)
        .await
        .map_err(duplicate_name)?;

        Self::get_group(db, group_id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_group(db: &PgPool, group_id: Uuid) -> Result<(), AppError> {
        let existing = Self::get_group_row(db, group_id).await?;
        ensure_not_system(&existing)?;

        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// The caller's role inside the group, if a member.
    pub async fn member_role(
        db: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<String>, AppError> {
        let role = sqlx::query_scalar::<_, String>(
            "SELECT member_role FROM group_members WHERE group_id = $1 AND user_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(role)
    }

    /// 404 for a missing group, 403 when `user_id` is not a member.
    pub async fn get_group_for_member(
        db: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<GroupResponse, AppError> {
        let group = Self::get_group_row(db, group_id).await?;
        if Self::member_role(db, group_id, user_id).await?.is_none() {
            return Err(AppError::forbidden(anyhow!("Not a member of group {group_id}")));
        }
        let members = Self::fetch_members(db, group_id).await?;
        Ok(GroupResponse::new(group, members))
    }

    /// 404 for a missing group, 403 unless `user_id` teaches it.
    pub async fn ensure_teaches(db: &PgPool, group_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        Self::get_group_row(db, group_id).await?;
        match Self::member_role(db, group_id, user_id).await? {
            Some(role) if role == RoleCode::Teacher.as_str() => Ok(()),
            _ => Err(AppError::forbidden(anyhow!(
                "User {user_id} does not teach group {group_id}"
            ))),
        }
    }

    /// Adds `user_id` or changes its member role.
    #[instrument(skip(db))]
    pub async fn add_member(
        db: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
        role: RoleCode,
    ) -> Result<GroupResponse, AppError> {
        let group = Self::get_group_row(db, group_id).await?;
        ensure_not_system(&group)?;

        let user_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        if !user_exists {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        sqlx::query(
            r#"INSERT INTO group_members (group_id, user_id, member_role, status)
               VALUES ($1, $2, $3, 'ACTIVE')
               ON CONFLICT (group_id, user_id)
               DO UPDATE SET member_role = EXCLUDED.member_role, updated_at = NOW()"#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(db)
        .await?;

        debug!(%group_id, %user_id, role = %role, "Group member added");
        Self::get_group(db, group_id).await
    }

    /// Returns whether a membership went away.
    #[instrument(skip(db))]
    pub async fn remove_member(db: &PgPool, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let group = Self::get_group_row(db, group_id).await?;
        ensure_not_system(&group)?;

        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
