mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, create_test_user, get_request, setup_test_app};
use lectern_models::MetricSample;
use lectern_telemetry::{PgSampleStore, SampleStore};
use sqlx::PgPool;
use tower::ServiceExt;

fn sample(minutes_ago: i64, heap: i64) -> MetricSample {
    MetricSample {
        captured_at: Utc::now() - Duration::minutes(minutes_ago),
        heap_used_bytes: heap,
        heap_max_bytes: 1 << 30,
        system_memory_total_bytes: 16 << 30,
        system_memory_used_bytes: 8 << 30,
        disk_total_bytes: 512 << 30,
        disk_used_bytes: 100 << 30,
        process_cpu_load: 0.1,
        system_cpu_load: 0.4,
    }
}

async fn seed(pool: &PgPool, count: i64) {
    let store = PgSampleStore::new(pool.clone());
    // Appended newest first so ordering cannot come from insertion order.
    for i in 0..count {
        store.append(&sample(i, i)).await.unwrap();
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_store_latest_is_ascending(pool: PgPool) {
    seed(&pool, 5).await;
    let store = PgSampleStore::new(pool);

    let items = store.latest(3).await.unwrap();

    let heaps: Vec<i64> = items.iter().map(|s| s.heap_used_bytes).collect();
    assert_eq!(heaps, vec![2, 1, 0]);
    assert!(items.windows(2).all(|w| w[0].captured_at <= w[1].captured_at));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_history_returns_recent_samples(pool: PgPool) {
    seed(&pool, 4).await;
    let admin = create_test_user(&pool, "password123", &["ADMIN"], "ACTIVE").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            "/api/admin/metrics/history?limit=2",
            Some(&admin.access_token()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["heapUsedBytes"], 1);
    assert_eq!(items[1]["heapUsedBytes"], 0);
    assert_eq!(items[1]["systemCpuLoad"], 0.4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_history_limit_is_clamped(pool: PgPool) {
    seed(&pool, 3).await;
    let admin = create_test_user(&pool, "password123", &["ADMIN"], "ACTIVE").await;
    let app = setup_test_app(pool);
    let token = admin.access_token();

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/metrics/history?limit=0", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(get_request("/api/admin/metrics/history", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_history_empty(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", &["ADMIN"], "ACTIVE").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/admin/metrics/history", Some(&admin.access_token())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "items": [] }));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_history_forbidden_for_teacher(pool: PgPool) {
    let teacher = create_test_user(&pool, "password123", &["TEACHER"], "ACTIVE").await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/admin/metrics/history", Some(&teacher.access_token())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
