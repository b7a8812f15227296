use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{AppError, AppResult};

lazy_static! {
    /// Hash verified against when the account does not exist, so an unknown
    /// email costs the same argon2 work as a wrong password.
    static ref DUMMY_HASH: Option<String> = hash_password("taskboard-dummy-password").ok();
}

/// Argon2id with a fresh random salt; returns the PHC string to persist.
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AppError::Internal(anyhow::anyhow!("password hashing failed: {e}"))
        })
}

/// `Ok(false)` on mismatch; `Err` only when `stored` is not a valid PHC string.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Spends one verification on the dummy hash and discards the outcome.
pub fn verify_dummy(plain: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}
