//! Integration tests for opening a database on an in-memory engine.

use portcullis_core::models::permission::CreatePermission;
use portcullis_core::repository::PermissionRepository;
use portcullis_db::Database;
use portcullis_db::repository::SurrealPermissionRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn open_migrates_to_latest_version() {
    let engine = Surreal::new::<Mem>(()).await.unwrap();

    let database = Database::open(engine, "test", "test").await.unwrap();

    assert_eq!(database.schema_version(), portcullis_db::latest_version());
    let stored = portcullis_db::current_version(database.client()).await.unwrap();
    assert_eq!(stored, portcullis_db::latest_version());
}

#[tokio::test]
async fn reopening_keeps_existing_data() {
    let engine = Surreal::new::<Mem>(()).await.unwrap();
    let first = Database::open(engine.clone(), "test", "test").await.unwrap();
    SurrealPermissionRepository::new(first.client().clone())
        .create(CreatePermission {
            name: "p1".into(),
            description: None,
        })
        .await
        .unwrap();

    let second = Database::open(engine, "test", "test").await.unwrap();

    assert_eq!(second.schema_version(), first.schema_version());
    let permissions = SurrealPermissionRepository::new(second.client().clone());
    assert!(permissions.get_by_name("p1").await.unwrap().is_some());
}
