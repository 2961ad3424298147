//! SurrealDB implementation of [`PermissionRepository`].

use chrono::{DateTime, Utc};
use portcullis_core::error::PortcullisResult;
use portcullis_core::models::permission::{CreatePermission, Permission, UpdatePermission};
use portcullis_core::repository::PermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;

const ENTITY: &str = "Permission";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PermissionRow {
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self, id: Uuid) -> Permission {
        Permission {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            last_modified: self.last_modified,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PermissionRowWithId {
    record_id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl PermissionRowWithId {
    fn try_into_permission(self) -> Result<Permission, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid permission UUID: {e}")))?;
        Ok(Permission {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            last_modified: self.last_modified,
        })
    }
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn create(&self, input: CreatePermission) -> PortcullisResult<Permission> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let name = input.name.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('permissions', $id) SET \
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

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        info!(permission = %name, "Permission created");
        Ok(row.into_permission(id))
    }

    async fn list(&self) -> PortcullisResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permissions \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        let permissions = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }

    async fn get_by_name(&self, name: &str) -> PortcullisResult<Option<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permissions \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_permission()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdatePermission) -> PortcullisResult<Permission> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("last_modified = time::now()");

        let query = format!(
            "UPDATE type::record('permissions', $id) SET {}",
            sets.join(", ")
        );

        let new_name = input.name.clone().unwrap_or_default();
        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY, &new_name))?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        debug!(permission = %row.name, "Permission updated");
        Ok(row.into_permission(id))
    }

    async fn delete(&self, id: Uuid) -> PortcullisResult<()> {
        let id_str = id.to_string();

        // Delete grants referencing the permission, then the record.
        let query = format!(
            "BEGIN TRANSACTION; \
             DELETE permission_role WHERE out = permissions:`{id_str}`; \
             DELETE type::record('permissions', $id); \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(permission_id = %id, "Permission deleted");
        Ok(())
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> PortcullisResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permissions \
                 WHERE id IN (\
                     SELECT VALUE out FROM permission_role \
                     WHERE in = type::record('roles', $role_id)\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        let permissions = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }
}
