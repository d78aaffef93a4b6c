//! Credential hashing.
//!
//! New credentials are always Argon2id in PHC form:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=1$<salt>$<key>
//! ```
//!
//! Credentials created by older deployments are bcrypt (`$2a$`, `$2b$`,
//! `$2y$`). Both verify; [`needs_rehash`] tells the login flow when a stored
//! credential should be upgraded.

use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::AppError;

/// Memory cost in KiB.
pub const ARGON2_MEMORY_KIB: u32 = 65536;
pub const ARGON2_ITERATIONS: u32 = 3;
pub const ARGON2_PARALLELISM: u32 = 1;
pub const ARGON2_KEY_LEN: usize = 32;

/// Verified against when a login names no known account, so that path pays
/// the same Argon2id cost as a wrong password. Its key is all zeroes and
/// matches no password.
pub const UNKNOWN_USER_CREDENTIAL: &str = "$argon2id$v=19$m=65536,t=3,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// The encoding a stored credential uses, read from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFormat {
    /// bcrypt.
    LegacyFixedCost,
    /// Argon2 in PHC string form.
    MemoryHard,
}

impl CredentialFormat {
    pub fn detect(credential: &str) -> Option<Self> {
        if credential.starts_with("$argon2") {
            Some(Self::MemoryHard)
        } else if ["$2a$", "$2b$", "$2y$"]
            .iter()
            .any(|prefix| credential.starts_with(prefix))
        {
            Some(Self::LegacyFixedCost)
        } else {
            None
        }
    }
}

fn argon2id() -> Result<Argon2<'static>, AppError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(ARGON2_KEY_LEN),
    )
    .map_err(|e| AppError::internal(anyhow!("Invalid argon2 parameters: {e}")))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `password` with Argon2id and a fresh 16-byte salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2id()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal(anyhow!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Checks `password` against a stored credential of either format.
///
/// Anything that cannot be parsed verifies as `false`.
pub fn verify_password(password: &str, credential: &str) -> bool {
    match CredentialFormat::detect(credential) {
        Some(CredentialFormat::MemoryHard) => {
            let Ok(parsed) = PasswordHash::new(credential) else {
                return false;
            };
            // Params, salt and variant come from the parsed hash.
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        }
        Some(CredentialFormat::LegacyFixedCost) => {
            bcrypt::verify(password, credential).unwrap_or(false)
        }
        None => false,
    }
}

/// True when `credential` is not in the current Argon2id form.
pub fn needs_rehash(credential: &str) -> bool {
    !matches!(
        CredentialFormat::detect(credential),
        Some(CredentialFormat::MemoryHard)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_has_expected_prefix() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=1$"));
    }

    #[test]
    fn test_hash_salt_and_key_lengths() {
        let hash = hash_password("correct horse").unwrap();
        let parts: Vec<&str> = hash.split('$').collect();
        // ["", "argon2id", "v=19", "m=65536,t=3,p=1", salt, key]
        assert_eq!(parts.len(), 6);
        // 16 bytes -> 22 unpadded base64 chars, 32 bytes -> 43
        assert_eq!(parts[4].len(), 22);
        assert_eq!(parts[5].len(), 43);
        assert!(!hash.contains('='));
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("s3cret-Pass", &hash));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("repeat").unwrap();
        let b = hash_password("repeat").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_bcrypt_credential() {
        let legacy = bcrypt::hash("legacy-pass", 4).unwrap();
        assert_eq!(
            CredentialFormat::detect(&legacy),
            Some(CredentialFormat::LegacyFixedCost)
        );
        assert!(verify_password("legacy-pass", &legacy));
        assert!(!verify_password("other", &legacy));
    }

    #[test]
    fn test_garbage_credentials_fail_closed() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "$argon2id$broken"));
        assert!(!verify_password("x", "$2b$not-bcrypt"));
    }

    #[test]
    fn test_unknown_user_credential_is_current_and_never_matches() {
        let parsed = PasswordHash::new(UNKNOWN_USER_CREDENTIAL).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert_eq!(parsed.hash.unwrap().len(), ARGON2_KEY_LEN);
        assert_eq!(parsed.params.get_decimal("m"), Some(ARGON2_MEMORY_KIB));
        assert_eq!(parsed.params.get_decimal("t"), Some(ARGON2_ITERATIONS));
        assert!(!needs_rehash(UNKNOWN_USER_CREDENTIAL));

        assert!(!verify_password("", UNKNOWN_USER_CREDENTIAL));
        assert!(!verify_password("password123", UNKNOWN_USER_CREDENTIAL));
    }

    #[test]
    fn test_needs_rehash() {
        let modern = hash_password("pw").unwrap();
        let legacy = bcrypt::hash("pw", 4).unwrap();
        assert!(!needs_rehash(&modern));
        assert!(needs_rehash(&legacy));
    }
}
