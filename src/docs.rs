use lectern_core::ErrorResponse;
use lectern_models::{
    AddMemberRequest, AssignRoleRequest, ChangePasswordRequest, CreateGroupRequest,
    CreateUserRequest, GroupMemberResponse, GroupResponse, GroupSummary, IdentityResponse,
    LoginRequest, MetricSample, MetricsHistoryResponse, ProfileResponse, RefreshTokenRequest,
    RegisterRequest, RegisterResponse, RoleCode, StatusResponse, TokenResponse,
    UpdateGroupRequest, UpdateProfileRequest, UpdateUserRequest, UpdateUserStatusRequest,
    UserResponse, UserStatus,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::logout,
        crate::modules::me::controller::get_me,
        crate::modules::me::controller::update_profile,
        crate::modules::me::controller::delete_me,
        crate::modules::me::controller::change_password,
        crate::modules::me::controller::ping,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::update_user_status,
        crate::modules::users::controller::assign_role,
        crate::modules::users::controller::remove_role,
        crate::modules::metrics::controller::metrics_history,
        crate::modules::areas::controller::teacher_ping,
        crate::modules::areas::controller::student_ping,
        crate::modules::groups::controller::admin_list_groups,
        crate::modules::groups::controller::admin_create_group,
        crate::modules::groups::controller::admin_get_group,
        crate::modules::groups::controller::admin_update_group,
        crate::modules::groups::controller::admin_delete_group,
        crate::modules::groups::controller::admin_add_member,
        crate::modules::groups::controller::admin_remove_member,
        crate::modules::groups::controller::teacher_list_groups,
        crate::modules::groups::controller::teacher_get_group,
        crate::modules::groups::controller::teacher_update_group,
        crate::modules::groups::controller::teacher_add_member,
        crate::modules::groups::controller::teacher_remove_member,
        crate::modules::groups::controller::student_list_groups,
        crate::modules::groups::controller::student_get_group,
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            RefreshTokenRequest,
            TokenResponse,
            StatusResponse,
            UserResponse,
            ProfileResponse,
            UserStatus,
            RoleCode,
            IdentityResponse,
            ChangePasswordRequest,
            CreateUserRequest,
            UpdateUserRequest,
            UpdateProfileRequest,
            UpdateUserStatusRequest,
            AssignRoleRequest,
            GroupResponse,
            GroupMemberResponse,
            GroupSummary,
            CreateGroupRequest,
            UpdateGroupRequest,
            AddMemberRequest,
            MetricSample,
            MetricsHistoryResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Me", description = "The authenticated user's own account"),
        (name = "Admin", description = "User and role administration"),
        (name = "Metrics", description = "Server telemetry history. Live samples stream over GET /ws/metrics?token=<access token>"),
        (name = "Areas", description = "Role-gated teacher and student areas"),
        (name = "Groups", description = "Groups and their members, seen by admins, teachers and students")
    ),
    info(
        title = "Lectern API",
        version = "0.1.0",
        description = "Educational platform backend: authentication, role-based access control and live server telemetry.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
