//! Error types for the Portcullis system.

use thiserror::Error;

/// Message returned for every failed login, whatever the cause.
pub const BAD_CREDENTIALS_MESSAGE: &str = "Email and password do not match";

#[derive(Debug, Error)]
pub enum PortcullisError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error("Duplicate {entity} not allowed: {name}")]
    Conflict { entity: String, name: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("{}", BAD_CREDENTIALS_MESSAGE)]
    BadCredentials,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortcullisError {
    pub fn not_found(entity: &str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.into(),
        }
    }

    pub fn conflict(entity: &str, name: impl Into<String>) -> Self {
        Self::Conflict {
            entity: entity.to_string(),
            name: name.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Whether the error is safe to show to API clients verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::BadRequest { .. }
                | Self::BadCredentials
        )
    }
}

pub type PortcullisResult<T> = Result<T, PortcullisError>;
