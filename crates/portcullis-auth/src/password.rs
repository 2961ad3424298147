//! Password verification using Argon2id.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

use crate::error::AuthError;

/// Well-formed Argon2id hash (OWASP parameters) that no password matches.
///
/// Verified in place of a real hash when the account does not exist, so
/// an unknown email costs as much time as a wrong password.
pub const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$\
AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// If `pepper` is provided it is prepended to the password before
/// verification; it must match the pepper used during hashing.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, AuthError> {
    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_string(),
    };

    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Burn one verification against [`DUMMY_HASH`]. Always a mismatch.
pub fn verify_dummy(password: &str, pepper: Option<&str>) {
    let _ = verify_password(password, DUMMY_HASH, pepper);
}
