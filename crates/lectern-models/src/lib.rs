//! # Lectern Models
//!
//! Domain models and DTOs for the Lectern API.
//!
//! - [`auth`]: login, registration and token payloads
//! - [`groups`]: membership groups
//! - [`metrics`]: server telemetry samples and history queries
//! - [`roles`]: the built-in role codes and their role groups
//! - [`users`]: user rows, statuses and the user DTO
//!
//! Request and response bodies are `camelCase` on the wire.

pub mod auth;
pub mod groups;
pub mod metrics;
pub mod roles;
pub mod users;

pub use auth::{
    LoginRequest, RefreshTokenRequest, RegisterRequest, RegisterResponse, StatusResponse,
    TokenResponse,
};
pub use groups::{
    AddMemberRequest, CreateGroupRequest, Group, GroupMemberResponse, GroupResponse, GroupSummary,
    GroupVisibility, UpdateGroupRequest,
};
pub use metrics::{MetricSample, MetricsHistoryParams, MetricsHistoryResponse};
pub use roles::{ParseRoleError, RoleCode};
pub use users::{
    AssignRoleRequest, ChangePasswordRequest, CreateUserRequest, IdentityResponse,
    ProfileResponse, UpdateProfileRequest, UpdateUserRequest, UpdateUserStatusRequest, User,
    UserResponse, UserStatus, normalize_email,
};
