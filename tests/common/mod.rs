#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use lectern::modules::role_groups::RoleGroupService;
use lectern::router::init_router;
use lectern::state::AppState;
use lectern_auth::TokenService;
use lectern_config::{CorsConfig, JwtConfig, MetricsConfig};
use lectern_core::hash_password;
use lectern_telemetry::MetricsHub;
use serde_json::Value;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        issuer: "lectern".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

pub fn test_tokens() -> TokenService {
    TokenService::new(&test_jwt_config())
}

/// State with a live hub. Must be called inside a Tokio runtime.
pub fn test_state(pool: PgPool) -> AppState {
    let (hub, _task) = MetricsHub::spawn(&MetricsConfig::default(), CancellationToken::new());
    AppState::new(pool, test_tokens(), hub, CorsConfig::default())
}

pub fn setup_test_app(pool: PgPool) -> axum::Router {
    init_router(test_state(pool))
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub roles: Vec<String>,
}

impl TestUser {
    pub fn access_token(&self) -> String {
        test_tokens()
            .create_access_token(self.id, &self.email, &self.roles)
            .unwrap()
            .0
    }

    pub fn refresh_token(&self) -> String {
        test_tokens().create_refresh_token(self.id).unwrap()
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

/// Inserts a user with an Argon2id credential, the given roles and status.
pub async fn create_test_user(
    pool: &PgPool,
    password: &str,
    roles: &[&str],
    status: &str,
) -> TestUser {
    let hash = hash_password(password).unwrap();
    create_test_user_with_hash(pool, &hash, password, roles, status).await
}

pub async fn create_test_user_with_hash(
    pool: &PgPool,
    password_hash: &str,
    password: &str,
    roles: &[&str],
    status: &str,
) -> TestUser {
    let email = generate_unique_email();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, password_hash, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&email)
    .bind(password_hash)
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap();

    for role in roles {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE code = $2",
        )
        .bind(id)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
        RoleGroupService::ensure_membership(pool, id, role)
            .await
            .unwrap();
    }

    let mut roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    roles.sort();

    TestUser {
        id,
        email,
        password: password.to_string(),
        roles,
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn membership_count(pool: &PgPool, user_id: Uuid, role: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*)
           FROM group_members gm
           JOIN groups g ON g.id = gm.group_id
           WHERE gm.user_id = $1 AND g.name = $2"#,
    )
    .bind(user_id)
    .bind(format!("Role: {role}"))
    .fetch_one(pool)
    .await
    .unwrap()
}
