//! Argon2id password hashing.
//!
//! Uses OWASP-recommended parameters (memory: 19 MiB, iterations: 2,
//! parallelism: 1). Salt is randomly generated per hash. An optional
//! pepper (server-side secret) is prepended to the password.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};

use crate::error::DbError;

/// Hash a password. Takes ownership so the plaintext is dropped as soon
/// as the hash exists.
pub(crate) fn hash_password(password: String, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password,
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| DbError::Hash(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}
