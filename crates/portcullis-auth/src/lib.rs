//! Portcullis Auth: credential verification and the password reset
//! flow.

pub mod config;
pub mod error;
pub mod password;
pub mod service;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::AuthService;
