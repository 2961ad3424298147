//! Opening a migrated Portcullis database.

use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::schema;

/// Where the Portcullis database lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address, `host:port`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "portcullis".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// A SurrealDB handle whose schema is known to be at the latest version.
///
/// Repositories take clones of [`Database::client`]; holding a
/// `Database` is proof that migrations ran on that handle.
#[derive(Clone)]
pub struct Database<C: Connection> {
    db: Surreal<C>,
    schema_version: u32,
}

impl Database<Client> {
    /// Sign in to a remote SurrealDB as root and open the configured
    /// namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(url = %config.url, "Connecting to SurrealDB");

        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        Self::open(db, &config.namespace, &config.database).await
    }
}

impl<C: Connection> Database<C> {
    /// Select `namespace`/`database` on an existing handle and bring its
    /// schema up to date.
    pub async fn open(db: Surreal<C>, namespace: &str, database: &str) -> Result<Self, DbError> {
        db.use_ns(namespace).use_db(database).await?;
        schema::run_migrations(&db).await?;
        let schema_version = schema::current_version(&db).await?;

        info!(namespace, database, schema_version, "Database ready");
        Ok(Self { db, schema_version })
    }

    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }

    /// Schema version observed right after migrating.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }
}
