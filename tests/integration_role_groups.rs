mod common;

use common::{create_test_user, membership_count};
use lectern::cli::{create_admin, sync_memberships};
use lectern::modules::role_groups::RoleGroupService;
use sqlx::PgPool;

async fn group_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE name LIKE 'Role: %'")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn insert_role(pool: &PgPool, user_id: uuid::Uuid, role: &str) {
    sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE code = $2")
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ensure_role_groups_is_idempotent(pool: PgPool) {
    RoleGroupService::ensure_role_groups(&pool).await.unwrap();
    RoleGroupService::ensure_role_groups(&pool).await.unwrap();

    assert_eq!(group_count(&pool).await, 3);

    let rows: Vec<(String, Option<String>, String)> = sqlx::query_as(
        "SELECT name, description, visibility FROM groups WHERE name LIKE 'Role: %' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let names: Vec<&str> = rows.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Role: ADMIN", "Role: STUDENT", "Role: TEACHER"]);
    for (name, description, visibility) in &rows {
        let code = name.trim_start_matches("Role: ");
        assert_eq!(
            description.as_deref(),
            Some(format!("System generated group for role {code}").as_str())
        );
        assert_eq!(visibility, "SYSTEM");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ensure_role_group_returns_existing_id(pool: PgPool) {
    let first = RoleGroupService::ensure_role_group(&pool, "TEACHER").await.unwrap();
    let second = RoleGroupService::ensure_role_group(&pool, "TEACHER").await.unwrap();

    assert_eq!(first, second);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ensure_membership_is_idempotent(pool: PgPool) {
    let user = create_test_user(&pool, "password123", &[], "ACTIVE").await;

    RoleGroupService::ensure_membership(&pool, user.id, "teacher").await.unwrap();
    RoleGroupService::ensure_membership(&pool, user.id, "TEACHER").await.unwrap();

    assert_eq!(membership_count(&pool, user.id, "TEACHER").await, 1);

    let (member_role, status): (String, String) = sqlx::query_as(
        r#"SELECT gm.member_role, gm.status
           FROM group_members gm
           JOIN groups g ON g.id = gm.group_id
           WHERE gm.user_id = $1 AND g.name = 'Role: TEACHER'"#,
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(member_role, "TEACHER");
    assert_eq!(status, "ACTIVE");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ensure_user_memberships_mirrors_roles(pool: PgPool) {
    let user = create_test_user(&pool, "password123", &[], "ACTIVE").await;
    insert_role(&pool, user.id, "ADMIN").await;
    insert_role(&pool, user.id, "STUDENT").await;

    RoleGroupService::ensure_user_memberships(&pool, user.id).await.unwrap();

    assert_eq!(membership_count(&pool, user.id, "ADMIN").await, 1);
    assert_eq!(membership_count(&pool, user.id, "STUDENT").await, 1);
    assert_eq!(membership_count(&pool, user.id, "TEACHER").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_remove_membership(pool: PgPool) {
    let user = create_test_user(&pool, "password123", &["TEACHER"], "ACTIVE").await;

    assert!(RoleGroupService::remove_membership(&pool, user.id, "TEACHER").await.unwrap());
    assert!(!RoleGroupService::remove_membership(&pool, user.id, "TEACHER").await.unwrap());
    assert_eq!(membership_count(&pool, user.id, "TEACHER").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_sync_memberships_repairs_missing_rows(pool: PgPool) {
    let a = create_test_user(&pool, "password123", &[], "ACTIVE").await;
    let b = create_test_user(&pool, "password123", &[], "ACTIVE").await;
    insert_role(&pool, a.id, "TEACHER").await;
    insert_role(&pool, b.id, "STUDENT").await;

    let synced = sync_memberships(&pool).await.unwrap();
    assert_eq!(synced, 2);
    assert_eq!(membership_count(&pool, a.id, "TEACHER").await, 1);
    assert_eq!(membership_count(&pool, b.id, "STUDENT").await, 1);

    sync_memberships(&pool).await.unwrap();
    assert_eq!(membership_count(&pool, a.id, "TEACHER").await, 1);
    assert_eq!(group_count(&pool).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_admin(pool: PgPool) {
    let user_id = create_admin(&pool, "  Root@Example.COM ", "password123").await.unwrap();

    let (email, status): (String, String) =
        sqlx::query_as("SELECT email, status FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(email, "root@example.com");
    assert_eq!(status, "ACTIVE");
    assert_eq!(membership_count(&pool, user_id, "ADMIN").await, 1);

    let duplicate = create_admin(&pool, "root@example.com", "password123").await;
    assert_eq!(duplicate.unwrap_err().status.as_u16(), 400);
}
