/// Password hashing and verification using Argon2id
use crate::error::{IdentityError, Result};
use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString,
    },
    Argon2,
};

/// Hash a password using Argon2id algorithm
///
/// ## Security
///
/// - Algorithm: Argon2id (default configuration)
/// - Salt: Random 16-byte salt drawn from the OS per call
///
/// Any input is accepted, including the empty string.
///
/// ## Returns
///
/// PHC-formatted hash string safe for database storage
///
/// ## Errors
///
/// Returns `IdentityError::Internal` if the OS random source fails or the
/// hashing operation fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = generate_salt()?;
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
///
/// Cost parameters and salt are read from the stored hash; the digest
/// comparison is constant-time.
///
/// ## Errors
///
/// - `IdentityError::Unauthenticated` if the password does not match
/// - `IdentityError::Malformed` if `password_hash` is empty or not a
///   recognizable Argon2 PHC string
pub fn verify_password(password: &str, password_hash: &str) -> Result<()> {
    if password_hash.is_empty() {
        return Err(IdentityError::Malformed(
            "Password hash is empty".to_string(),
        ));
    }

    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| IdentityError::Malformed(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(()),
        Err(HashError::Password) => Err(IdentityError::Unauthenticated),
        Err(e) => Err(IdentityError::Malformed(format!(
            "Unsupported password hash: {}",
            e
        ))),
    }
}

fn generate_salt() -> Result<SaltString> {
    let mut bytes = [0u8; Salt::RECOMMENDED_LENGTH];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| IdentityError::Internal(format!("Random source failed: {}", e)))?;

    SaltString::encode_b64(&bytes)
        .map_err(|e| IdentityError::Internal(format!("Salt encoding failed: {}", e)))
}
