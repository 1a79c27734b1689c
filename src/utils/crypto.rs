use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::utils::error::{AppError, AppResult};

/// PHC-format argon2id hash with a fresh random salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Could not hash credential: {}", e)))
}

/// A stored hash that does not parse never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::error!("Stored credential is not a valid PHC string");
        return Ok(false);
    };

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
