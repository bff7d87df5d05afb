//! Share-link password hashing.
//!
//! Passwords are stored as Argon2id PHC strings carrying their own salt and
//! parameters, so verification never needs the original settings.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;

use super::error::{VaultError, VaultResult};

/// Hash a share-link password with a fresh random salt.
pub fn hash_password(password: &str) -> VaultResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| VaultError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> VaultResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| VaultError::PasswordHash("stored hash is malformed".into()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
