use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use lectern_models::RoleCode;
use lectern_observability::{is_metrics_enabled, logging_middleware, metrics_middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::middleware::auth::require_auth;
use crate::middleware::role::{enforce_roles, require_role};
use crate::modules::areas::{init_student_router, init_teacher_router};
use crate::modules::auth::init_auth_router;
use crate::modules::groups::init_admin_groups_router;
use crate::modules::me::init_me_router;
use crate::modules::metrics::{init_metrics_router, init_ws_router};
use crate::modules::users::init_users_router;
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .nest("/users", init_users_router())
        .nest("/groups", init_admin_groups_router())
        .nest("/metrics", init_metrics_router())
        .route_layer(middleware::from_fn_with_state(
            require_role(RoleCode::Admin.as_str()),
            enforce_roles,
        ));

    // Role gates run inside `require_auth`, which is layered last so it runs first.
    let protected_routes = Router::new()
        .nest("/me", init_me_router())
        .nest("/admin", admin_routes)
        .nest("/teacher", init_teacher_router())
        .nest("/student", init_student_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .merge(protected_routes),
        )
        .nest("/ws", init_ws_router())
        .with_state(state.clone());

    if state.cors_config.is_enabled() {
        router = router.layer(cors_layer(&state.cors_config.allowed_origins));
    }
    if is_metrics_enabled() {
        router = router.layer(middleware::from_fn(metrics_middleware));
    }

    router.layer(middleware::from_fn(logging_middleware))
}
