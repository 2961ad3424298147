//! Shared helpers for the attribute-less relation tables
//! (`permission_role`, `role_group`, `user_role`).

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NamedIdRow {
    record_id: String,
    name: String,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Names split into the record keys they resolve to and the names that
/// matched nothing. Both keep the caller's order; repeated names are
/// collapsed.
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    pub(crate) ids: Vec<String>,
    pub(crate) unresolved: Vec<String>,
}

/// Look up record keys for `names` in `table`.
pub(crate) async fn resolve_names<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    names: &[String],
) -> Result<Resolution, DbError> {
    if names.is_empty() {
        return Ok(Resolution::default());
    }

    let query = format!("SELECT meta::id(id) AS record_id, name FROM {table} WHERE name IN $names");
    let mut result = db.query(query).bind(("names", names.to_vec())).await?;
    let rows: Vec<NamedIdRow> = result.take(0)?;

    Ok(partition(names, &rows))
}

fn partition(names: &[String], rows: &[NamedIdRow]) -> Resolution {
    let mut resolution = Resolution::default();
    for name in names {
        match rows.iter().find(|r| &r.name == name) {
            Some(row) => {
                if !resolution.ids.contains(&row.record_id) {
                    resolution.ids.push(row.record_id.clone());
                }
            }
            None => {
                if !resolution.unresolved.contains(name) {
                    resolution.unresolved.push(name.clone());
                }
            }
        }
    }
    resolution
}

/// Whether `table` holds a record keyed by `id`.
pub(crate) async fn record_exists<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    id: &str,
) -> Result<bool, DbError> {
    let query = format!(
        "SELECT count() AS total FROM {table} \
         WHERE id = type::record('{table}', $id) GROUP ALL"
    );
    let mut result = db.query(query).bind(("id", id.to_string())).await?;
    let rows: Vec<CountRow> = result.take(0)?;
    Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
}

/// Record keys already linked from `owner` through `relation`.
pub(crate) async fn linked_ids<C: Connection>(
    db: &Surreal<C>,
    relation: &str,
    owner_table: &str,
    owner_id: &str,
) -> Result<Vec<String>, DbError> {
    let query = format!(
        "SELECT meta::id(out) AS record_id FROM {relation} \
         WHERE in = type::record('{owner_table}', $owner_id)"
    );
    let mut result = db
        .query(query)
        .bind(("owner_id", owner_id.to_string()))
        .await?;
    let rows: Vec<IdRow> = result.take(0)?;
    Ok(rows.into_iter().map(|r| r.record_id).collect())
}

/// RELATE statements for every target not already linked.
///
/// Membership is a set: targets present in `existing` produce no
/// statement, so repeating an update never duplicates an edge.
pub(crate) fn relate_statements(
    owner_table: &str,
    owner_id: &str,
    relation: &str,
    target_table: &str,
    targets: &[String],
    existing: &[String],
) -> Vec<String> {
    targets
        .iter()
        .filter(|t| !existing.contains(t))
        .map(|t| {
            format!("RELATE {owner_table}:`{owner_id}` -> {relation} -> {target_table}:`{t}`;")
        })
        .collect()
}

/// Wrap statements in a single SurrealDB transaction.
pub(crate) fn transaction(statements: Vec<String>) -> String {
    let mut query = String::from("BEGIN TRANSACTION;\n");
    for statement in statements {
        query.push_str(&statement);
        query.push('\n');
    }
    query.push_str("COMMIT TRANSACTION;");
    query
}
