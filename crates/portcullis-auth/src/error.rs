//! Authentication error types.

use portcullis_core::error::PortcullisError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email, wrong password and inactive account all collapse
    /// into this variant.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password reset {0} not found")]
    ResetNotFound(String),

    #[error("password reset is expired or already used")]
    ResetNotRedeemable,

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("password reset lifetime of {0}s cannot be applied")]
    InvalidResetLifetime(u64),
}

impl From<AuthError> for PortcullisError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => PortcullisError::BadCredentials,
            AuthError::ResetNotFound(id) => PortcullisError::not_found("PasswordReset", id),
            AuthError::ResetNotRedeemable => PortcullisError::bad_request(err.to_string()),
            AuthError::Crypto(msg) => PortcullisError::Crypto(msg),
            AuthError::InvalidResetLifetime(_) => PortcullisError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_core::error::BAD_CREDENTIALS_MESSAGE;

    #[test]
    fn invalid_credentials_uses_fixed_message() {
        let err: PortcullisError = AuthError::InvalidCredentials.into();
        assert!(matches!(err, PortcullisError::BadCredentials));
        assert_eq!(err.to_string(), BAD_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn spent_reset_is_a_client_error() {
        let err: PortcullisError = AuthError::ResetNotRedeemable.into();
        assert!(matches!(err, PortcullisError::BadRequest { .. }));
    }
}
