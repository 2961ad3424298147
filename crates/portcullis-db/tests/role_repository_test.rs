//! Integration tests for the Role repository using in-memory SurrealDB.

use portcullis_core::error::PortcullisError;
use portcullis_core::models::permission::CreatePermission;
use portcullis_core::models::role::{CreateRole, Role, UpdateRole};
use portcullis_core::repository::{PermissionRepository, RoleRepository};
use portcullis_db::repository::{SurrealPermissionRepository, SurrealRoleRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

struct Fixture {
    permissions: SurrealPermissionRepository<Db>,
    roles: SurrealRoleRepository<Db>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    portcullis_db::run_migrations(&db).await.unwrap();

    Fixture {
        permissions: SurrealPermissionRepository::new(db.clone()),
        roles: SurrealRoleRepository::new(db),
    }
}

async fn create_role(fx: &Fixture, name: &str) -> Role {
    fx.roles
        .create(CreateRole {
            name: name.into(),
            description: Some(format!("{name} role")),
        })
        .await
        .unwrap()
}

async fn create_permission(fx: &Fixture, name: &str) {
    fx.permissions
        .create(CreatePermission {
            name: name.into(),
            description: None,
        })
        .await
        .unwrap();
}

async fn permission_names(fx: &Fixture, role: &Role) -> Vec<String> {
    fx.permissions
        .get_role_permissions(role.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect()
}

fn grant(names: &[&str]) -> UpdateRole {
    UpdateRole {
        permissions: Some(names.iter().map(|n| n.to_string()).collect()),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_and_fetch_role() {
    let fx = setup().await;
    let created = create_role(&fx, "admin").await;

    let fetched = fx.roles.get_by_name("admin").await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.description.as_deref(), Some("admin role"));
    assert_eq!(fx.roles.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_role_conflicts_and_keeps_original() {
    let fx = setup().await;
    let original = create_role(&fx, "admin").await;

    let err = fx
        .roles
        .create(CreateRole {
            name: "admin".into(),
            description: Some("impostor".into()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PortcullisError::Conflict { .. }), "{err:?}");

    let fetched = fx.roles.get_by_name("admin").await.unwrap().unwrap();
    assert_eq!(fetched.id, original.id);
    assert_eq!(fetched.description.as_deref(), Some("admin role"));
}

#[tokio::test]
async fn update_skips_unresolved_permissions() {
    let fx = setup().await;
    create_permission(&fx, "p1").await;
    let role = create_role(&fx, "admin").await;

    let outcome = fx
        .roles
        .update(role.id, grant(&["p1", "nonexistent"]))
        .await
        .unwrap();

    assert_eq!(outcome.unresolved_permissions, vec!["nonexistent"]);
    assert_eq!(permission_names(&fx, &role).await, vec!["p1"]);
}

#[tokio::test]
async fn repeated_update_does_not_duplicate_membership() {
    let fx = setup().await;
    create_permission(&fx, "p1").await;
    let role = create_role(&fx, "admin").await;

    fx.roles.update(role.id, grant(&["p1"])).await.unwrap();
    fx.roles.update(role.id, grant(&["p1", "p1"])).await.unwrap();

    assert_eq!(permission_names(&fx, &role).await, vec!["p1"]);
}

#[tokio::test]
async fn update_merges_rather_than_replaces() {
    let fx = setup().await;
    create_permission(&fx, "p1").await;
    create_permission(&fx, "p2").await;
    let role = create_role(&fx, "admin").await;

    fx.roles.update(role.id, grant(&["p1"])).await.unwrap();
    fx.roles.update(role.id, grant(&["p2"])).await.unwrap();

    assert_eq!(permission_names(&fx, &role).await, vec!["p1", "p2"]);
}

#[tokio::test]
async fn update_scalar_fields_and_permissions_together() {
    let fx = setup().await;
    create_permission(&fx, "p1").await;
    let role = create_role(&fx, "admin").await;

    let outcome = fx
        .roles
        .update(
            role.id,
            UpdateRole {
                name: Some("superuser".into()),
                description: Some(None),
                permissions: Some(vec!["p1".into()]),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.role.name, "superuser");
    assert!(outcome.role.description.is_none());
    assert!(outcome.unresolved_permissions.is_empty());
    assert!(fx.roles.get_by_name("admin").await.unwrap().is_none());
    assert_eq!(permission_names(&fx, &role).await, vec!["p1"]);
}

#[tokio::test]
async fn conflicting_rename_rolls_back_membership() {
    let fx = setup().await;
    create_permission(&fx, "p1").await;
    create_role(&fx, "taken").await;
    let role = create_role(&fx, "admin").await;

    let err = fx
        .roles
        .update(
            role.id,
            UpdateRole {
                name: Some("taken".into()),
                permissions: Some(vec!["p1".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    match err {
        PortcullisError::Conflict { entity, name } => {
            assert_eq!(entity, "Role");
            assert_eq!(name, "taken");
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    assert!(permission_names(&fx, &role).await.is_empty());
    assert!(fx.roles.get_by_name("admin").await.unwrap().is_some());
}

#[tokio::test]
async fn concurrent_updates_adding_same_permission_both_succeed() {
    let fx = setup().await;
    create_permission(&fx, "p1").await;
    let role = create_role(&fx, "admin").await;

    let (first, second) = tokio::join!(
        fx.roles.update(role.id, grant(&["p1"])),
        fx.roles.update(role.id, grant(&["p1"])),
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(permission_names(&fx, &role).await, vec!["p1"]);
}

#[tokio::test]
async fn update_unknown_role_is_not_found() {
    let fx = setup().await;

    let err = fx
        .roles
        .update(uuid::Uuid::new_v4(), grant(&["p1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, PortcullisError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn delete_makes_role_unreachable() {
    let fx = setup().await;
    create_permission(&fx, "p1").await;
    let role = create_role(&fx, "admin").await;
    fx.roles.update(role.id, grant(&["p1"])).await.unwrap();

    fx.roles.delete(role.id).await.unwrap();

    assert!(fx.roles.get_by_name("admin").await.unwrap().is_none());
    assert!(permission_names(&fx, &role).await.is_empty());
    // The permission itself survives.
    assert!(fx.permissions.get_by_name("p1").await.unwrap().is_some());
}
