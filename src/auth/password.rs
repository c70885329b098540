//! Account passwords, stored as argon2 PHC strings.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Verified against when a login names an unknown account, so that path
    /// costs the same as a wrong password.
    static ref DECOY_HASH: Option<String> = hash_password("cashin-decoy-credential").ok();
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` for a mismatch; `Err` only when `stored` is not a usable hash.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("verify password: {e}")),
    }
}

pub fn burn_verification(plain: &str) {
    if let Some(hash) = DECOY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_form_is_argon2id_phc() {
        let stored = hash_password("rent-money-2024").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("rent-money-2024"));
        assert!(verify_password("rent-money-2024", &stored).unwrap());
    }

    #[test]
    fn each_hash_gets_its_own_salt() {
        let first = hash_password("shared").unwrap();
        let second = hash_password("shared").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("shared", &second).unwrap());
    }

    #[test]
    fn mismatch_is_false_not_an_error() {
        let stored = hash_password("rent-money-2024").unwrap();
        assert!(!verify_password("Rent-money-2024", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn corrupt_stored_hash_is_an_error() {
        assert!(verify_password("x", "$argon2id$broken").is_err());
        assert!(verify_password("x", "").is_err());
    }

    #[test]
    fn decoy_hash_is_usable() {
        let decoy = DECOY_HASH.as_deref().expect("decoy hash is built");
        assert!(!verify_password("any guess", decoy).unwrap());
        burn_verification("any guess");
    }
}
