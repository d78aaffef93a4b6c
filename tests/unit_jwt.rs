use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use lectern_auth::{TokenClaims, TokenService};
use lectern_config::JwtConfig;
use serde_json::{Value, json};
use uuid::Uuid;

const SECRET: &str = "test_secret_key_for_testing_purposes";

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: SECRET.to_string(),
        issuer: "lectern".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

fn sign(payload: Value, algorithm: Algorithm) -> String {
    encode(
        &Header::new(algorithm),
        &payload,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn raw_payload(token: &str) -> Value {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["lectern"]);
    decode::<Value>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
        .unwrap()
        .claims
}

#[test]
fn test_access_token_payload_shape() {
    let service = TokenService::new(&get_test_jwt_config());
    let user_id = Uuid::new_v4();
    let roles = vec!["ADMIN".to_string(), "TEACHER".to_string()];

    let (token, exp) = service
        .create_access_token(user_id, "admin@example.com", &roles)
        .unwrap();
    let payload = raw_payload(&token);

    assert_eq!(payload["typ"], "access");
    assert_eq!(payload["iss"], "lectern");
    assert_eq!(payload["sub"], user_id.to_string());
    assert_eq!(payload["email"], "admin@example.com");
    assert_eq!(payload["roles"], json!(["ADMIN", "TEACHER"]));
    assert_eq!(payload["exp"].as_i64().unwrap(), exp);
    assert_eq!(exp - payload["iat"].as_i64().unwrap(), 3600);
}

#[test]
fn test_refresh_token_payload_shape() {
    let service = TokenService::new(&get_test_jwt_config());

    let token = service.create_refresh_token(Uuid::new_v4()).unwrap();
    let payload = raw_payload(&token);

    assert_eq!(payload["typ"], "refresh");
    assert!(payload.get("roles").is_none());
    assert!(payload.get("email").is_none());
    let lifetime = payload["exp"].as_i64().unwrap() - payload["iat"].as_i64().unwrap();
    assert_eq!(lifetime, 604800);
}

#[test]
fn test_token_without_typ_rejected() {
    let service = TokenService::new(&get_test_jwt_config());
    let now = Utc::now().timestamp();
    let token = sign(
        json!({
            "iss": "lectern",
            "sub": Uuid::new_v4().to_string(),
            "email": "old@example.com",
            "iat": now,
            "exp": now + 600
        }),
        Algorithm::HS256,
    );

    assert!(service.parse_token(&token).is_err());
}

#[test]
fn test_non_uuid_subject_rejected() {
    let service = TokenService::new(&get_test_jwt_config());
    let now = Utc::now().timestamp();
    let token = sign(
        json!({
            "iss": "lectern",
            "sub": "42",
            "typ": "refresh",
            "iat": now,
            "exp": now + 600
        }),
        Algorithm::HS256,
    );

    assert!(service.parse_token(&token).is_err());
}

#[test]
fn test_other_algorithm_rejected() {
    let service = TokenService::new(&get_test_jwt_config());
    let now = Utc::now().timestamp();
    let token = sign(
        json!({
            "iss": "lectern",
            "sub": Uuid::new_v4().to_string(),
            "typ": "refresh",
            "iat": now,
            "exp": now + 600
        }),
        Algorithm::HS512,
    );

    assert!(service.parse_token(&token).is_err());
}

#[test]
fn test_refresh_token_with_roles_still_refresh() {
    let service = TokenService::new(&get_test_jwt_config());
    let now = Utc::now().timestamp();
    let token = sign(
        json!({
            "iss": "lectern",
            "sub": Uuid::new_v4().to_string(),
            "typ": "refresh",
            "roles": ["ADMIN"],
            "iat": now,
            "exp": now + 600
        }),
        Algorithm::HS256,
    );

    let claims = service.parse_token(&token).unwrap();
    assert!(matches!(claims, TokenClaims::Refresh(_)));
    assert!(claims.expect_access().is_err());
}

#[test]
fn test_tokens_from_other_issuer_rejected() {
    let other = TokenService::new(&JwtConfig {
        issuer: "someone-else".to_string(),
        ..get_test_jwt_config()
    });
    let service = TokenService::new(&get_test_jwt_config());

    let (token, _) = other
        .create_access_token(Uuid::new_v4(), "t@example.com", &[])
        .unwrap();

    assert!(service.parse_token(&token).is_err());
}

#[test]
fn test_malformed_roles_claim_parses_with_lenient_roles() {
    let service = TokenService::new(&get_test_jwt_config());
    let now = Utc::now().timestamp();
    let user_id = Uuid::new_v4();
    let signed = |roles: Value| {
        sign(
            json!({
                "iss": "lectern",
                "sub": user_id.to_string(),
                "typ": "access",
                "email": "t@example.com",
                "roles": roles,
                "iat": now,
                "exp": now + 600
            }),
            Algorithm::HS256,
        )
    };

    let claims = service
        .parse_token(&signed(json!("ADMIN")))
        .unwrap()
        .expect_access()
        .unwrap();
    assert_eq!(claims.user_id, user_id);
    assert!(claims.roles.is_empty());

    let claims = service
        .parse_token(&signed(json!([1, "TEACHER"])))
        .unwrap()
        .expect_access()
        .unwrap();
    assert_eq!(claims.roles, vec!["TEACHER".to_string()]);
}
