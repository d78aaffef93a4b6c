use axum::{Router, middleware, routing::get};

use super::controller::{student_ping, teacher_ping};
use crate::middleware::role::{enforce_roles, require_any_role, require_role};
use crate::modules::groups::{init_student_groups_router, init_teacher_groups_router};
use crate::state::AppState;

pub fn init_teacher_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(teacher_ping))
        .nest("/groups", init_teacher_groups_router())
        .route_layer(middleware::from_fn_with_state(
            require_any_role(["TEACHER", "ADMIN"]),
            enforce_roles,
        ))
}

pub fn init_student_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(student_ping))
        .nest("/groups", init_student_groups_router())
        .route_layer(middleware::from_fn_with_state(
            require_role("STUDENT"),
            enforce_roles,
        ))
}
