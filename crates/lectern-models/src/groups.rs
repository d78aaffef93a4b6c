//! Membership groups.
//!
//! Role groups are `SYSTEM` groups kept in step with role grants; every
//! other group is `PRIVATE` and managed through the group endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupVisibility {
    Private,
    System,
}

impl GroupVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupVisibility::Private => "PRIVATE",
            GroupVisibility::System => "SYSTEM",
        }
    }
}

/// A row of the `groups` table.
#[derive(Debug, Clone, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub grade: Option<i32>,
    pub year: Option<i32>,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn is_system(&self) -> bool {
        self.visibility == GroupVisibility::System.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberResponse {
    pub user_id: Uuid,
    pub email: String,
    pub member_role: String,
}

/// A group with its members, ordered by email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub grade: Option<i32>,
    pub year: Option<i32>,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<GroupMemberResponse>,
}

impl GroupResponse {
    pub fn new(group: Group, members: Vec<GroupMemberResponse>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            grade: group.grade,
            year: group.year,
            visibility: group.visibility,
            created_at: group.created_at,
            members,
        }
    }
}

/// Admin listing row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub grade: Option<i32>,
    pub year: Option<i32>,
    pub visibility: String,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[schema(example = "Physics 10A")]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 12, message = "Grade must be between 1 and 12"))]
    pub grade: Option<i32>,
    pub year: Option<i32>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 12, message = "Grade must be between 1 and 12"))]
    pub grade: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "Member role is required"))]
    #[schema(example = "STUDENT")]
    pub member_role: String,
}
