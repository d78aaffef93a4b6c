use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::modules::users::controller::{
    assign_role, create_user, delete_user, list_users, remove_role, update_user,
    update_user_status,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", put(update_user).delete(delete_user))
        .route("/{id}/status", put(update_user_status))
        .route("/{id}/roles", post(assign_role))
        .route("/{id}/roles/{role}", delete(remove_role))
}
