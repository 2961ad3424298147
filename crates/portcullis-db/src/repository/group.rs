//! SurrealDB implementation of [`GroupRepository`].

use chrono::{DateTime, Utc};
use portcullis_core::error::PortcullisResult;
use portcullis_core::models::group::{CreateGroup, Group, GroupUpdateOutcome, UpdateGroup};
use portcullis_core::repository::GroupRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::membership;
use crate::error::DbError;

const ENTITY: &str = "Group";
const MAX_UPDATE_ATTEMPTS: u32 = 3;

#[derive(Debug, SurrealValue)]
struct GroupRow {
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Group {
        Group {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            last_modified: self.last_modified,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid group UUID: {e}")))?;
        Ok(Group {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            last_modified: self.last_modified,
        })
    }
}

#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Group>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('groups', $id)")
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<GroupRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.into_group(id)))
    }

    /// Merge `roles` into the group's roles and apply the scalar
    /// changes, all in one transaction.
    ///
    /// Edges are diffed against what is linked at call time, so a
    /// concurrent update adding the same role surfaces as
    /// [`DbError::MembershipRace`] and the caller re-runs the merge.
    async fn apply_update(
        &self,
        id: &str,
        roles: &[String],
        name: Option<&str>,
        description: Option<&Option<String>>,
    ) -> Result<(), DbError> {
        let existing = membership::linked_ids(&self.db, "role_group", "groups", id).await?;
        let mut statements = membership::relate_statements(
            "groups", id, "role_group", "roles", roles, &existing,
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
            "UPDATE type::record('groups', $id) SET {};",
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
            "idx_groups_name",
        ))
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> PortcullisResult<Group> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let name = input.name.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('groups', $id) SET \
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

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        info!(group = %name, "Group created");
        Ok(row.into_group(id))
    }

    async fn list(&self) -> PortcullisResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM groups \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }

    async fn get_by_name(&self, name: &str) -> PortcullisResult<Option<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM groups \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_group()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdateGroup) -> PortcullisResult<GroupUpdateOutcome> {
        let id_str = id.to_string();

        if self.get_by_id(id).await?.is_none() {
            return Err(DbError::NotFound {
                entity: ENTITY.into(),
                key: id_str,
            }
            .into());
        }

        let requested = input.roles.unwrap_or_default();
        let resolution = membership::resolve_names(&self.db, "roles", &requested).await?;
        if !resolution.unresolved.is_empty() {
            warn!(
                group_id = %id,
                unresolved = ?resolution.unresolved,
                "Skipping unknown roles in group update"
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
                    debug!(group_id = %id, attempt, %reason, "Retrying group update");
                    attempt += 1;
                }
                other => return Err(other.into()),
            }
        }

        let group = self.get_by_id(id).await?.ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            key: id_str,
        })?;

        debug!(group = %group.name, "Group updated");
        Ok(GroupUpdateOutcome {
            group,
            unresolved_roles: resolution.unresolved,
        })
    }

    async fn delete(&self, id: Uuid) -> PortcullisResult<()> {
        let id_str = id.to_string();

        let query = format!(
            "BEGIN TRANSACTION; \
             DELETE role_group WHERE in = groups:`{id_str}`; \
             DELETE type::record('groups', $id); \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(group_id = %id, "Group deleted");
        Ok(())
    }
}
