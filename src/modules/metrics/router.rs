use axum::{Router, routing::get};

use super::controller::{metrics_history, metrics_socket};
use crate::state::AppState;

/// Mounted under `/api/admin/metrics`, behind the admin gate.
pub fn init_metrics_router() -> Router<AppState> {
    Router::new().route("/history", get(metrics_history))
}

/// Mounted under `/ws`. Authenticates from the query string itself.
pub fn init_ws_router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_socket))
}
