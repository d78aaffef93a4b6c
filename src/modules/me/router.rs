use axum::{
    Router,
    routing::{get, post, put},
};

use super::controller::{change_password, delete_me, get_me, ping, update_profile};
use crate::state::AppState;

pub fn init_me_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_me).delete(delete_me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .route("/ping", post(ping))
}
