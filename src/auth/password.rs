use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};

use super::error::AuthError;

lazy_static! {
    /// Checked against when the email is unknown so both login failures cost one verification.
    static ref DUMMY_HASH: String = hash_password(DUMMY_PASSWORD)
        .expect("argon2 with default params hashes a constant");
}

const DUMMY_PASSWORD: &str = "keystead-timing-equaliser";

/// Argon2id with a fresh salt; returns a PHC string.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AuthError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Malformed hashes verify as `false`.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored hash is not a valid PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

fn burn_verification(plain: &str) {
    let _ = verify_password(plain, &DUMMY_HASH);
}

/// `hash_password` on the blocking pool so the async worker stays free.
pub async fn hash_in_background(plain: &str) -> Result<String, AuthError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| {
            error!(error = %e, "hashing task failed");
            AuthError::Hashing(e.to_string())
        })?
}

/// `verify_password` on the blocking pool. With no stored hash the dummy hash
/// is checked instead and the result is always `false`.
pub async fn verify_in_background(plain: &str, hash: Option<String>) -> bool {
    let plain = plain.to_owned();
    let res = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&plain, &hash),
        None => {
            burn_verification(&plain);
            false
        }
    })
    .await;
    match res {
        Ok(ok) => ok,
        Err(e) => {
            error!(error = %e, "verification task failed");
            false
        }
    }
}
