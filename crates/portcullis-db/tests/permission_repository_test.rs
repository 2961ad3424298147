//! Integration tests for the Permission repository using in-memory SurrealDB.

use portcullis_core::error::PortcullisError;
use portcullis_core::models::permission::{CreatePermission, UpdatePermission};
use portcullis_core::models::role::{CreateRole, UpdateRole};
use portcullis_core::repository::{PermissionRepository, RoleRepository};
use portcullis_db::repository::{SurrealPermissionRepository, SurrealRoleRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    portcullis_db::run_migrations(&db).await.unwrap();
    db
}

fn permission(name: &str, description: Option<&str>) -> CreatePermission {
    CreatePermission {
        name: name.into(),
        description: description.map(Into::into),
    }
}

#[tokio::test]
async fn create_then_fetch_by_name() {
    let repo = SurrealPermissionRepository::new(setup().await);

    let created = repo
        .create(permission("p1", Some("read things")))
        .await
        .unwrap();

    let fetched = repo.get_by_name("p1").await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "p1");
    assert_eq!(fetched.description.as_deref(), Some("read things"));
}

#[tokio::test]
async fn lookup_is_case_sensitive() {
    let repo = SurrealPermissionRepository::new(setup().await);
    repo.create(permission("p1", None)).await.unwrap();

    assert!(repo.get_by_name("P1").await.unwrap().is_none());
    assert!(repo.get_by_name("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_name_conflicts_and_keeps_original() {
    let repo = SurrealPermissionRepository::new(setup().await);
    let original = repo.create(permission("p1", Some("first"))).await.unwrap();

    let err = repo
        .create(permission("p1", Some("second")))
        .await
        .unwrap_err();
    assert!(matches!(err, PortcullisError::Conflict { .. }), "{err:?}");

    let fetched = repo.get_by_name("p1").await.unwrap().unwrap();
    assert_eq!(fetched.id, original.id);
    assert_eq!(fetched.description.as_deref(), Some("first"));
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_returns_all_rows() {
    let repo = SurrealPermissionRepository::new(setup().await);
    for name in ["a", "b", "c"] {
        repo.create(permission(name, None)).await.unwrap();
    }

    let names: Vec<String> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names.len(), 3);
    for name in ["a", "b", "c"] {
        assert!(names.contains(&name.to_string()));
    }
}

#[tokio::test]
async fn update_applies_only_present_fields() {
    let repo = SurrealPermissionRepository::new(setup().await);
    let created = repo.create(permission("p1", Some("desc"))).await.unwrap();

    let renamed = repo
        .update(
            created.id,
            UpdatePermission {
                name: Some("p2".into()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "p2");
    assert_eq!(renamed.description.as_deref(), Some("desc"));
    assert!(renamed.last_modified >= created.last_modified);

    let cleared = repo
        .update(
            created.id,
            UpdatePermission {
                name: None,
                description: Some(None),
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.name, "p2");
    assert!(cleared.description.is_none());
}

#[tokio::test]
async fn rename_to_existing_name_conflicts() {
    let repo = SurrealPermissionRepository::new(setup().await);
    repo.create(permission("p1", None)).await.unwrap();
    let other = repo.create(permission("p2", None)).await.unwrap();

    let err = repo
        .update(
            other.id,
            UpdatePermission {
                name: Some("p1".into()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PortcullisError::Conflict { .. }), "{err:?}");
    assert!(repo.get_by_name("p2").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_removes_row_and_grants() {
    let db = setup().await;
    let permissions = SurrealPermissionRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let p1 = permissions.create(permission("p1", None)).await.unwrap();
    let role = roles
        .create(CreateRole {
            name: "admin".into(),
            description: None,
        })
        .await
        .unwrap();
    roles
        .update(
            role.id,
            UpdateRole {
                permissions: Some(vec!["p1".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    permissions.delete(p1.id).await.unwrap();

    assert!(permissions.get_by_name("p1").await.unwrap().is_none());
    assert!(
        permissions
            .get_role_permissions(role.id)
            .await
            .unwrap()
            .is_empty()
    );
}
