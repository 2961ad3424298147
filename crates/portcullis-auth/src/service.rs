//! Authentication service: credential checks and password reset
//! orchestration.

use chrono::Utc;
use portcullis_core::error::PortcullisResult;
use portcullis_core::models::password_reset::{CreatePasswordReset, PasswordReset};
use portcullis_core::models::user::User;
use portcullis_core::repository::{PasswordResetRepository, UserRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, R: PasswordResetRepository> {
    user_repo: U,
    reset_repo: R,
    config: AuthConfig,
}

impl<U: UserRepository, R: PasswordResetRepository> AuthService<U, R> {
    pub fn new(user_repo: U, reset_repo: R, config: AuthConfig) -> Self {
        Self {
            user_repo,
            reset_repo,
            config,
        }
    }

    /// Check an email/password pair.
    ///
    /// Unknown email, wrong password and inactive account fail with the
    /// same error. A dummy hash is verified when the email is unknown.
    pub async fn authenticate(&self, email: &str, password: &str) -> PortcullisResult<User> {
        let pepper = self.config.pepper.as_deref();

        let Some(user) = self.user_repo.get_by_email(email).await? else {
            password::verify_dummy(password, pepper);
            debug!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        let valid = password::verify_password(password, &user.password_hash, pepper)?;
        if !valid || !user.is_active {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }

        info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }

    /// Issue a password reset for the account behind `email`.
    ///
    /// Returns `None` when no such account exists; callers must not
    /// reveal the difference to clients.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> PortcullisResult<Option<PasswordReset>> {
        let Some(user) = self.user_repo.get_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let expires_at = self
            .config
            .reset_lifetime()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or(AuthError::InvalidResetLifetime(
                self.config.reset_token_lifetime_secs,
            ))?;

        let reset = self
            .reset_repo
            .create(CreatePasswordReset {
                user_id: user.id,
                expires_at,
            })
            .await?;

        Ok(Some(reset))
    }

    /// Look up a reset by its identifier.
    pub async fn get_password_reset(&self, id: Uuid) -> PortcullisResult<Option<PasswordReset>> {
        self.reset_repo.get_by_id(id).await
    }

    /// Redeem a reset and store `new_password` for its owner.
    pub async fn confirm_password_reset(
        &self,
        reset_id: Uuid,
        new_password: String,
    ) -> PortcullisResult<User> {
        let reset = self
            .reset_repo
            .get_by_id(reset_id)
            .await?
            .ok_or_else(|| AuthError::ResetNotFound(reset_id.to_string()))?;

        if !reset.is_redeemable(Utc::now()) {
            return Err(AuthError::ResetNotRedeemable.into());
        }

        self.reset_repo.redeem(reset_id, new_password).await
    }
}
