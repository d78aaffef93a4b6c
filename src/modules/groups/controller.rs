use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lectern_core::{AppError, ErrorResponse};
use lectern_models::{
    AddMemberRequest, CreateGroupRequest, GroupResponse, GroupSummary, RoleCode,
    UpdateGroupRequest,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::Identity;
use crate::modules::groups::service::GroupService;
use crate::modules::users::service::parse_role;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List every group
#[utoipa::path(
    get,
    path = "/api/admin/groups",
    responses(
        (status = 200, description = "All groups with member counts", body = Vec<GroupSummary>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn admin_list_groups(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<GroupSummary>>, AppError> {
    Ok(Json(GroupService::list_groups(&state.db).await?))
}

/// Create a group
#[utoipa::path(
    post,
    path = "/api/admin/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Validation error or duplicate name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state, request))]
pub async fn admin_create_group(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(request): ValidatedJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), AppError> {
    let group = GroupService::create_group(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// Get any group with its members
#[utoipa::path(
    get,
    path = "/api/admin/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group details", body = GroupResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn admin_get_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, AppError> {
    Ok(Json(GroupService::get_group(&state.db, id).await?))
}

/// Update a group
#[utoipa::path(
    put,
    path = "/api/admin/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = GroupResponse),
        (status = 400, description = "Validation error, duplicate name or system group", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state, request))]
pub async fn admin_update_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    Ok(Json(GroupService::update_group(&state.db, id, &request).await?))
}

/// Delete a group
#[utoipa::path(
    delete,
    path = "/api/admin/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 400, description = "System group", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn admin_delete_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    GroupService::delete_group(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a member or change its role
#[utoipa::path(
    post,
    path = "/api/admin/groups/{id}/members",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Updated group", body = GroupResponse),
        (status = 400, description = "Unknown role or system group", body = ErrorResponse),
        (status = 404, description = "Group or user not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn admin_add_member(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddMemberRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let role = parse_role(&request.member_role)?;
    let group = GroupService::add_member(&state.db, id, request.user_id, role).await?;
    Ok(Json(group))
}

/// Remove a member
#[utoipa::path(
    delete,
    path = "/api/admin/groups/{id}/members/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Group ID"),
        ("user_id" = Uuid, Path, description = "Member user ID"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 400, description = "System group", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn admin_remove_member(
    State(state): State<AppState>,
    identity: Identity,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    GroupService::remove_member(&state.db, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Groups the caller belongs to
#[utoipa::path(
    get,
    path = "/api/teacher/groups",
    responses(
        (status = 200, description = "Caller's groups", body = Vec<GroupResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is neither teacher nor admin", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn teacher_list_groups(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    Ok(Json(GroupService::list_user_groups(&state.db, identity.user_id).await?))
}

/// A group the caller belongs to
#[utoipa::path(
    get,
    path = "/api/teacher/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group details", body = GroupResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn teacher_get_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = GroupService::get_group_for_member(&state.db, id, identity.user_id).await?;
    Ok(Json(group))
}

/// Update a group the caller teaches
#[utoipa::path(
    put,
    path = "/api/teacher/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = GroupResponse),
        (status = 403, description = "Caller does not teach this group", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state, request))]
pub async fn teacher_update_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    GroupService::ensure_teaches(&state.db, id, identity.user_id).await?;
    Ok(Json(GroupService::update_group(&state.db, id, &request).await?))
}

/// Add a student to a group the caller teaches
#[utoipa::path(
    post,
    path = "/api/teacher/groups/{id}/members",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Updated group", body = GroupResponse),
        (status = 400, description = "Unknown role", body = ErrorResponse),
        (status = 403, description = "Caller does not teach this group, or role is not STUDENT", body = ErrorResponse),
        (status = 404, description = "Group or user not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn teacher_add_member(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddMemberRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    GroupService::ensure_teaches(&state.db, id, identity.user_id).await?;

    let role = parse_role(&request.member_role)?;
    if role != RoleCode::Student {
        return Err(AppError::forbidden(anyhow!("Teachers may only add students, not {role}")));
    }

    let group = GroupService::add_member(&state.db, id, request.user_id, role).await?;
    Ok(Json(group))
}

/// Remove a student from a group the caller teaches
#[utoipa::path(
    delete,
    path = "/api/teacher/groups/{id}/members/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Group ID"),
        ("user_id" = Uuid, Path, description = "Member user ID"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Caller does not teach this group, or member is not a student", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn teacher_remove_member(
    State(state): State<AppState>,
    identity: Identity,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    GroupService::ensure_teaches(&state.db, id, identity.user_id).await?;

    let member_role = GroupService::member_role(&state.db, id, user_id).await?;
    if member_role.as_deref() != Some(RoleCode::Student.as_str()) {
        return Err(AppError::forbidden(anyhow!(
            "Member {user_id} of group {id} is not a student"
        )));
    }

    GroupService::remove_member(&state.db, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Groups the caller belongs to
#[utoipa::path(
    get,
    path = "/api/student/groups",
    responses(
        (status = 200, description = "Caller's groups", body = Vec<GroupResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a student", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn student_list_groups(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    Ok(Json(GroupService::list_user_groups(&state.db, identity.user_id).await?))
}

/// A group the caller belongs to
#[utoipa::path(
    get,
    path = "/api/student/groups/{id}",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group details", body = GroupResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
#[instrument(skip(state))]
pub async fn student_get_group(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = GroupService::get_group_for_member(&state.db, id, identity.user_id).await?;
    Ok(Json(group))
}
