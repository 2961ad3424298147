//! SurrealDB implementation of [`UserRepository`].
//!
//! Passwords are hashed with Argon2id (see [`crate::password`]) before
//! the record is built. An optional pepper (server-side secret) can be
//! provided at construction time.

use chrono::{DateTime, Utc};
use portcullis_core::error::PortcullisResult;
use portcullis_core::models::user::{CreateUser, User};
use portcullis_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use super::membership;
use crate::error::DbError;
use crate::password::hash_password;

const ENTITY: &str = "User";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
pub(crate) struct UserRow {
    email: String,
    password_hash: String,
    full_name: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_user(self, id: Uuid) -> User {
        User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            is_active: self.is_active,
            created_at: self.created_at,
            last_modified: self.last_modified,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    password_hash: String,
    full_name: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            is_active: self.is_active,
            created_at: self.created_at,
            last_modified: self.last_modified,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> PortcullisResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let email = input.email.clone();

        let password_hash = hash_password(input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('users', $id) SET \
                 email = $email, password_hash = $password_hash, \
                 full_name = $full_name, is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("full_name", input.full_name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY, &email))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        info!(user_id = %id, "User created");
        Ok(row.into_user(id))
    }

    async fn get_by_id(&self, id: Uuid) -> PortcullisResult<Option<User>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('users', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.into_user(id)))
    }

    async fn get_by_email(&self, email: &str) -> PortcullisResult<Option<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM users \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn set_password(&self, id: Uuid, password: String) -> PortcullisResult<User> {
        let id_str = id.to_string();
        let password_hash = hash_password(password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "UPDATE type::record('users', $id) SET \
                 password_hash = $password_hash, last_modified = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        debug!(user_id = %id, "Password changed");
        Ok(row.into_user(id))
    }

    async fn grant_role(&self, user_id: Uuid, role_id: Uuid) -> PortcullisResult<()> {
        let user_str = user_id.to_string();
        let role_str = role_id.to_string();

        if !membership::record_exists(&self.db, "users", &user_str).await? {
            return Err(DbError::NotFound {
                entity: ENTITY.into(),
                key: user_str,
            }
            .into());
        }
        if !membership::record_exists(&self.db, "roles", &role_str).await? {
            return Err(DbError::NotFound {
                entity: "Role".into(),
                key: role_str,
            }
            .into());
        }

        let existing = membership::linked_ids(&self.db, "user_role", "users", &user_str).await?;
        let statements = membership::relate_statements(
            "users",
            &user_str,
            "user_role",
            "roles",
            std::slice::from_ref(&role_str),
            &existing,
        );
        if statements.is_empty() {
            return Ok(());
        }

        self.db
            .query(membership::transaction(statements))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(user_id = %user_id, role_id = %role_id, "Role granted to user");
        Ok(())
    }
}
