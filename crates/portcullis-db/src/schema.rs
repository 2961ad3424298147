//! Schema definitions and migration runner for SurrealDB.
//!
//! Migrations form a linear chain: version N is applied on top of
//! version N-1 and every migration carries the script that undoes it,
//! so the schema can be replayed forward or rolled back one step at a
//! time. All tables use SCHEMAFULL mode. External identifiers are UUIDs
//! used as record keys and stored as strings in foreign-key fields.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    up: &'static str,
    down: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: CREATE_USERS_UP,
        down: CREATE_USERS_DOWN,
    },
    Migration {
        version: 2,
        name: "create_permissions",
        up: CREATE_PERMISSIONS_UP,
        down: CREATE_PERMISSIONS_DOWN,
    },
    Migration {
        version: 3,
        name: "create_roles",
        up: CREATE_ROLES_UP,
        down: CREATE_ROLES_DOWN,
    },
    Migration {
        version: 4,
        name: "create_groups",
        up: CREATE_GROUPS_UP,
        down: CREATE_GROUPS_DOWN,
    },
    Migration {
        version: 5,
        name: "create_user_roles",
        up: CREATE_USER_ROLES_UP,
        down: CREATE_USER_ROLES_DOWN,
    },
];

// -----------------------------------------------------------------------
// v1: users and password resets
// -----------------------------------------------------------------------

const CREATE_USERS_UP: &str = "\
DEFINE TABLE users SCHEMAFULL;
DEFINE FIELD email ON TABLE users TYPE string;
DEFINE FIELD password_hash ON TABLE users TYPE string;
DEFINE FIELD full_name ON TABLE users TYPE option<string>;
DEFINE FIELD is_active ON TABLE users TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE users TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD last_modified ON TABLE users TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_users_email ON TABLE users COLUMNS email UNIQUE;

DEFINE TABLE password_resets SCHEMAFULL;
DEFINE FIELD user_id ON TABLE password_resets TYPE string;
DEFINE FIELD expires_at ON TABLE password_resets TYPE datetime;
DEFINE FIELD used ON TABLE password_resets TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE password_resets TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_password_resets_user ON TABLE password_resets \
    COLUMNS user_id;
";

const CREATE_USERS_DOWN: &str = "\
REMOVE TABLE IF EXISTS password_resets;
REMOVE TABLE IF EXISTS users;
";

// -----------------------------------------------------------------------
// v2: permissions
// -----------------------------------------------------------------------

const CREATE_PERMISSIONS_UP: &str = "\
DEFINE TABLE permissions SCHEMAFULL;
DEFINE FIELD name ON TABLE permissions TYPE string;
DEFINE FIELD description ON TABLE permissions TYPE option<string>;
DEFINE FIELD created_at ON TABLE permissions TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD last_modified ON TABLE permissions TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permissions_name ON TABLE permissions \
    COLUMNS name UNIQUE;
";

const CREATE_PERMISSIONS_DOWN: &str = "\
REMOVE TABLE IF EXISTS permissions;
";

// -----------------------------------------------------------------------
// v3: roles and the role -> permission relation
// -----------------------------------------------------------------------

const CREATE_ROLES_UP: &str = "\
DEFINE TABLE roles SCHEMAFULL;
DEFINE FIELD name ON TABLE roles TYPE string;
DEFINE FIELD description ON TABLE roles TYPE option<string>;
DEFINE FIELD created_at ON TABLE roles TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD last_modified ON TABLE roles TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_roles_name ON TABLE roles COLUMNS name UNIQUE;

-- roles -> permission_role -> permissions
DEFINE TABLE permission_role TYPE RELATION FROM roles TO permissions \
    SCHEMAFULL;
DEFINE INDEX idx_permission_role_pair ON TABLE permission_role \
    COLUMNS in, out UNIQUE;
";

const CREATE_ROLES_DOWN: &str = "\
REMOVE TABLE IF EXISTS permission_role;
REMOVE TABLE IF EXISTS roles;
";

// -----------------------------------------------------------------------
// v4: groups and the group -> role relation
// -----------------------------------------------------------------------

const CREATE_GROUPS_UP: &str = "\
DEFINE TABLE groups SCHEMAFULL;
DEFINE FIELD name ON TABLE groups TYPE string;
DEFINE FIELD description ON TABLE groups TYPE option<string>;
DEFINE FIELD created_at ON TABLE groups TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD last_modified ON TABLE groups TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_groups_name ON TABLE groups COLUMNS name UNIQUE;

-- groups -> role_group -> roles
DEFINE TABLE role_group TYPE RELATION FROM groups TO roles SCHEMAFULL;
DEFINE INDEX idx_role_group_pair ON TABLE role_group \
    COLUMNS in, out UNIQUE;
";

const CREATE_GROUPS_DOWN: &str = "\
REMOVE TABLE IF EXISTS role_group;
REMOVE TABLE IF EXISTS groups;
";

// -----------------------------------------------------------------------
// v5: direct user -> role grants
// -----------------------------------------------------------------------

const CREATE_USER_ROLES_UP: &str = "\
DEFINE TABLE user_role TYPE RELATION FROM users TO roles SCHEMAFULL;
DEFINE INDEX idx_user_role_pair ON TABLE user_role \
    COLUMNS in, out UNIQUE;
";

const CREATE_USER_ROLES_DOWN: &str = "\
REMOVE TABLE IF EXISTS user_role;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Version of the newest migration known to this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Highest migration version recorded in the database (0 when none).
pub async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum, in order.
/// Re-running with nothing pending is a no-op.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    let current = current_version(db).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.up).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

        info!(
            version = migration.version,
            "Migration applied successfully"
        );
    }

    Ok(())
}

/// Undo applied migrations, newest first, until the schema is at
/// `target` (use 0 to remove everything).
pub async fn rollback_to<C: Connection>(db: &Surreal<C>, target: u32) -> Result<(), DbError> {
    let current = current_version(db).await?;

    for migration in MIGRATIONS
        .iter()
        .rev()
        .filter(|m| m.version > target && m.version <= current)
    {
        info!(
            version = migration.version,
            name = migration.name,
            "Reverting migration"
        );
        db.query(migration.down).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Rollback of v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("DELETE _migration WHERE version = $version")
            .bind(("version", migration.version))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to unrecord migration v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}
