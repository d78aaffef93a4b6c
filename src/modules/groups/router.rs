use axum::{
    Router,
    routing::{delete, get, post},
};

use super::controller::{
    admin_add_member, admin_create_group, admin_delete_group, admin_get_group, admin_list_groups,
    admin_remove_member, admin_update_group, student_get_group, student_list_groups,
    teacher_add_member, teacher_get_group, teacher_list_groups, teacher_remove_member,
    teacher_update_group,
};
use crate::state::AppState;

pub fn init_admin_groups_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list_groups).post(admin_create_group))
        .route(
            "/{id}",
            get(admin_get_group)
                .put(admin_update_group)
                .delete(admin_delete_group),
        )
        .route("/{id}/members", post(admin_add_member))
        .route("/{id}/members/{user_id}", delete(admin_remove_member))
}

pub fn init_teacher_groups_router() -> Router<AppState> {
    Router::new()
        .route("/", get(teacher_list_groups))
        .route("/{id}", get(teacher_get_group).put(teacher_update_group))
        .route("/{id}/members", post(teacher_add_member))
        .route("/{id}/members/{user_id}", delete(teacher_remove_member))
}

pub fn init_student_groups_router() -> Router<AppState> {
    Router::new()
        .route("/", get(student_list_groups))
        .route("/{id}", get(student_get_group))
}
