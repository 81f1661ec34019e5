//! Argon2id password hashing.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check the length policy, then hash to a PHC string with a fresh salt.
pub(super) fn hash_new(password: &str) -> Result<String, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AuthError::PasswordHash
        })
}

/// Stand-in hash for usernames with no account.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"no account has this password", &salt)
        .map(|phc| phc.to_string())
        .ok()
});

/// Spend one verification on [`DUMMY_HASH`], so an unknown username takes
/// as long to refuse as a wrong password.
pub(super) fn verify_dummy(password: &str) {
    match DUMMY_HASH.as_deref() {
        Some(phc) => {
            matches(password, phc);
        }
        None => tracing::warn!("Dummy password hash unavailable"),
    }
}

/// Whether `password` matches the stored PHC string. An unparsable hash
/// matches nothing.
pub(super) fn matches(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|phc| {
        Argon2::default()
            .verify_password(password.as_bytes(), &phc)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_match() {
        let phc = hash_new("correct horse").unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(matches("correct horse", &phc));
        assert!(!matches("wrong horse", &phc));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_new("same-password").unwrap(), hash_new("same-password").unwrap());
    }

    #[test]
    fn test_short_password_is_weak() {
        assert!(matches!(
            hash_new("short"),
            Err(AuthError::WeakPassword { min: MIN_PASSWORD_LENGTH })
        ));
    }

    #[test]
    fn test_dummy_hash_costs_a_real_verification() {
        let phc = DUMMY_HASH.as_deref().unwrap();
        let parsed = PasswordHash::new(phc).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(!matches("analytical", phc));
        verify_dummy("analytical");
    }

    #[test]
    fn test_garbage_hash_matches_nothing() {
        assert!(!matches("anything", "not-a-phc-string"));
    }
}
