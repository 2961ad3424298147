//! SurrealDB implementation of [`PasswordResetRepository`].

use chrono::{DateTime, Utc};
use portcullis_core::error::PortcullisResult;
use portcullis_core::models::password_reset::{CreatePasswordReset, PasswordReset};
use portcullis_core::models::user::User;
use portcullis_core::repository::PasswordResetRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::user::UserRow;
use crate::error::DbError;
use crate::password::hash_password;

const ENTITY: &str = "PasswordReset";

/// Log target carrying newly issued reset ids. The id is a bearer
/// credential, so events on this target are emitted at `debug` and only
/// appear when the target is enabled explicitly.
pub const RESET_DELIVERY_TARGET: &str = "portcullis::reset_delivery";

/// Claims the reset and rotates the owner's hash, or changes nothing.
const REDEEM_QUERY: &str = "\
BEGIN TRANSACTION;
LET $claimed = (
    UPDATE type::record('password_resets', $id) SET used = true
    WHERE used = false AND expires_at > time::now()
    RETURN AFTER
);
IF array::len($claimed) = 0 {
    THROW 'password reset is no longer redeemable';
};
UPDATE type::record('users', $user_id) SET
    password_hash = $password_hash, last_modified = time::now();
COMMIT TRANSACTION;";

#[derive(Debug, SurrealValue)]
struct PasswordResetRow {
    user_id: String,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
}

impl PasswordResetRow {
    fn try_into_reset(self, id: Uuid) -> Result<PasswordReset, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(PasswordReset {
            id,
            user_id,
            expires_at: self.expires_at,
            used: self.used,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the PasswordReset repository.
#[derive(Clone)]
pub struct SurrealPasswordResetRepository<C: Connection> {
    db: Surreal<C>,
    /// Must match the pepper the user repository hashes with.
    pepper: Option<String>,
}

impl<C: Connection> SurrealPasswordResetRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Option<PasswordReset>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('password_resets', $id)")
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<PasswordResetRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_reset(id))
            .transpose()
    }
}

impl<C: Connection> PasswordResetRepository for SurrealPasswordResetRepository<C> {
    async fn create(&self, input: CreatePasswordReset) -> PortcullisResult<PasswordReset> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('password_resets', $id) SET \
                 user_id = $user_id, expires_at = $expires_at, used = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PasswordResetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        info!(user_id = %input.user_id, "Password reset issued");
        debug!(
            target: RESET_DELIVERY_TARGET,
            reset_id = %id,
            user_id = %input.user_id,
            "Password reset ready for delivery"
        );
        Ok(row.try_into_reset(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> PortcullisResult<Option<PasswordReset>> {
        Ok(self.find(id).await?)
    }

    async fn redeem(&self, id: Uuid, new_password: String) -> PortcullisResult<User> {
        let reset = self.find(id).await?.ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id.to_string(),
        })?;
        let user_id = reset.user_id.to_string();

        let password_hash = hash_password(new_password, self.pepper.as_deref())?;

        let outcome = self
            .db
            .query(REDEEM_QUERY)
            .bind(("id", id.to_string()))
            .bind(("user_id", user_id.clone()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?
            .check();

        if let Err(err) = outcome {
            // Distinguish a lost race on the reset from a storage failure.
            let still_redeemable = self
                .find(id)
                .await?
                .is_some_and(|r| r.is_redeemable(Utc::now()));
            if still_redeemable {
                return Err(DbError::Query(err.to_string()).into());
            }
            warn!(reset_id = %id, "Rejected redemption of spent password reset");
            return Err(DbError::Rejected("Password reset is expired or already used".into()).into());
        }

        let mut result = self
            .db
            .query("SELECT * FROM type::record('users', $id)")
            .bind(("id", user_id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "User".into(),
            key: user_id,
        })?;

        info!(reset_id = %id, user_id = %reset.user_id, "Password reset redeemed");
        Ok(row.into_user(reset.user_id))
    }
}
