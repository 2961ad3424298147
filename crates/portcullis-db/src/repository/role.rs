//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use portcullis_core::error::PortcullisResult;
use portcullis_core::models::role::{CreateRole, Role, RoleUpdateOutcome, UpdateRole};
use portcullis_core::repository::RoleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::membership;
use crate::error::DbError;

const ENTITY: &str = "Role";
const MAX_UPDATE_ATTEMPTS: u32 = 3;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Role {
        Role {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            last_modified: self.last_modified,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid role UUID: {e}")))?;
        Ok(Role {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            last_modified: self.last_modified,
        })
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Role>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('roles', $id)")
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<RoleRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.into_role(id)))
    }

    async fn select_roles(&self, query: &str, key: &str, id: Uuid) -> PortcullisResult<Vec<Role>> {
        let mut result = self
            .db
            .query(query)
            .bind((key.to_string(), id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }

    /// Merge `permissions` into the role's permissions and apply the scalar
    /// changes, all in one transaction.
    ///
    /// Edges are diffed against what is linked at call time, so a
    /// concurrent update adding the same permission surfaces as
    /// [`DbError::MembershipRace`] and the caller re-runs the merge.
    async fn apply_update(
        &self,
        id: &str,
        permissions: &[String],
        name: Option<&str>,
        description: Option<&Option<String>>,
    ) -> Result<(), DbError> {
        let existing = membership::linked_ids(&self.db, "permission_role", "roles", id).await?;
        let mut statements = membership::relate_statements(
            "roles", id, "permission_role", "permissions", permissions, &existing,
        );

        let mut sets = Vec::new();
        if name.is_some() {
            sets.push("name = $name");
        }
        if description.is_some() {
            sets.push("description = $description");
        }
        sets.push("last_modified = time::now()");
        statements.push(format!(
            "UPDATE type::record('roles', $id) SET {};",
            sets.join(", ")
        ));

        let mut builder = self
            .db
            .query(membership::transaction(statements))
            .bind(("id", id.to_string()));
        if let Some(name) = name {
            builder = builder.bind(("name", name.to_string()));
        }
        if let Some(description) = description {
            builder = builder.bind(("description", description.clone()));
        }

        let errors = builder.await?.take_errors();
        if errors.is_empty() {
            return Ok(());
        }
        Err(DbError::from_statements(
            errors,
            ENTITY,
            name.unwrap_or_default(),
            "idx_roles_name",
        ))
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> PortcullisResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let name = input.name.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('roles', $id) SET \
                 name = $name, description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY, &name))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        info!(role = %name, "Role created");
        Ok(row.into_role(id))
    }

    async fn list(&self) -> PortcullisResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM roles \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }

    async fn get_by_name(&self, name: &str) -> PortcullisResult<Option<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM roles \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_role()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdateRole) -> PortcullisResult<RoleUpdateOutcome> {
        let id_str = id.to_string();

        if self.get_by_id(id).await?.is_none() {
            return Err(DbError::NotFound {
                entity: ENTITY.into(),
                key: id_str,
            }
            .into());
        }

        let requested = input.permissions.unwrap_or_default();
        let resolution = membership::resolve_names(&self.db, "permissions", &requested).await?;
        if !resolution.unresolved.is_empty() {
            warn!(
                role_id = %id,
                unresolved = ?resolution.unresolved,
                "Skipping unknown permissions in role update"
            );
        }

        let name = input.name.as_deref();
        let description = input.description.as_ref();
        let mut attempt = 1;
        while let Err(err) = self
            .apply_update(&id_str, &resolution.ids, name, description)
            .await
        {
            match err {
                DbError::MembershipRace(reason) if attempt < MAX_UPDATE_ATTEMPTS => {
                    debug!(role_id = %id, attempt, %reason, "Retrying role update");
                    attempt += 1;
                }
                other => return Err(other.into()),
            }
        }

        let role = self.get_by_id(id).await?.ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        debug!(role = %role.name, "Role updated");
        Ok(RoleUpdateOutcome {
            role,
            unresolved_permissions: resolution.unresolved,
        })
    }

    async fn delete(&self, id: Uuid) -> PortcullisResult<()> {
        let id_str = id.to_string();

        // Delete associated edges first, then the role record.
        let query = format!(
            "BEGIN TRANSACTION; \
             DELETE permission_role WHERE in = roles:`{id_str}`; \
             DELETE role_group WHERE out = roles:`{id_str}`; \
             DELETE user_role WHERE out = roles:`{id_str}`; \
             DELETE type::record('roles', $id); \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    async fn get_group_roles(&self, group_id: Uuid) -> PortcullisResult<Vec<Role>> {
        self.select_roles(
            "SELECT meta::id(id) AS record_id, * FROM roles \
             WHERE id IN (\
                 SELECT VALUE out FROM role_group \
                 WHERE in = type::record('groups', $group_id)\
             ) \
             ORDER BY name ASC",
            "group_id",
            group_id,
        )
        .await
    }

    async fn get_user_roles(&self, user_id: Uuid) -> PortcullisResult<Vec<Role>> {
        self.select_roles(
            "SELECT meta::id(id) AS record_id, * FROM roles \
             WHERE id IN (\
                 SELECT VALUE out FROM user_role \
                 WHERE in = type::record('users', $user_id)\
             ) \
             ORDER BY name ASC",
            "user_id",
            user_id,
        )
        .await
    }
}
