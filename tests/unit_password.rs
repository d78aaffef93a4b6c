use lectern_core::{CredentialFormat, hash_password, needs_rehash, verify_password};

#[test]
fn test_hash_password_success() {
    let password = "testpassword123";
    let hash = hash_password(password).unwrap();

    assert_ne!(hash, password);
    assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=1$"));
    assert_eq!(CredentialFormat::detect(&hash), Some(CredentialFormat::MemoryHard));
    assert!(!needs_rehash(&hash));
}

#[test]
fn test_hash_password_empty() {
    let hash = hash_password("").unwrap();

    assert!(verify_password("", &hash));
    assert!(!verify_password(" ", &hash));
}

#[test]
fn test_verify_password_incorrect() {
    let hash = hash_password("correctpassword").unwrap();

    assert!(verify_password("correctpassword", &hash));
    assert!(!verify_password("wrongpassword", &hash));
    assert!(!verify_password("CORRECTPASSWORD", &hash));
}

#[test]
fn test_verify_unicode_password() {
    let password = "pässwörd-密码-🔑";
    let hash = hash_password(password).unwrap();

    assert!(verify_password(password, &hash));
    assert!(!verify_password("passwort-密码-🔑", &hash));
}

#[test]
fn test_bcrypt_credentials_verify_and_need_rehash() {
    for version in [bcrypt::Version::TwoA, bcrypt::Version::TwoB, bcrypt::Version::TwoY] {
        let legacy = bcrypt::hash_with_result("legacy-password", 4)
            .unwrap()
            .format_for_version(version);

        assert_eq!(
            CredentialFormat::detect(&legacy),
            Some(CredentialFormat::LegacyFixedCost)
        );
        assert!(verify_password("legacy-password", &legacy));
        assert!(!verify_password("other-password", &legacy));
        assert!(needs_rehash(&legacy));
    }
}

#[test]
fn test_truncated_credentials_fail_closed() {
    let hash = hash_password("password123").unwrap();
    let truncated = &hash[..hash.len() - 10];

    assert!(!verify_password("password123", truncated));
    assert!(!verify_password("password123", "$2b$04$short"));
    assert!(!verify_password("password123", "plaintext"));
    assert!(!verify_password("password123", ""));
    assert_eq!(CredentialFormat::detect("md5:abcdef"), None);
    assert!(needs_rehash("md5:abcdef"));
}
