//! Integration tests for the User repository using in-memory SurrealDB.

use portcullis_core::error::PortcullisError;
use portcullis_core::models::role::CreateRole;
use portcullis_core::models::user::CreateUser;
use portcullis_core::repository::{RoleRepository, UserRepository};
use portcullis_db::repository::{SurrealRoleRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    portcullis_db::run_migrations(&db).await.unwrap();
    db
}

fn alice() -> CreateUser {
    CreateUser {
        email: "alice@example.com".into(),
        password: "correct horse battery staple".into(),
        full_name: Some("Alice".into()),
    }
}

#[tokio::test]
async fn create_user_hashes_password() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(alice()).await.unwrap();

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.full_name.as_deref(), Some("Alice"));
    assert!(user.is_active);
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(!user.password_hash.contains("correct horse"));
}

#[tokio::test]
async fn lookups_by_id_and_email() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(alice()).await.unwrap();

    let by_id = repo.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, user.email);

    let by_email = repo.get_by_email("alice@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(repo.get_by_id(uuid::Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.get_by_email("bob@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let repo = SurrealUserRepository::new(setup().await);
    let first = repo.create(alice()).await.unwrap();

    let err = repo.create(alice()).await.unwrap_err();
    assert!(matches!(err, PortcullisError::Conflict { .. }), "{err:?}");

    let stored = repo.get_by_email("alice@example.com").await.unwrap().unwrap();
    assert_eq!(stored.id, first.id);
}

#[tokio::test]
async fn set_password_replaces_hash() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(alice()).await.unwrap();

    let updated = repo
        .set_password(user.id, "another password".into())
        .await
        .unwrap();
    assert_ne!(updated.password_hash, user.password_hash);

    let err = repo
        .set_password(uuid::Uuid::new_v4(), "whatever".into())
        .await
        .unwrap_err();
    assert!(matches!(err, PortcullisError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn grant_role_is_idempotent() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let user = users.create(alice()).await.unwrap();
    let admin = roles
        .create(CreateRole {
            name: "admin".into(),
            description: None,
        })
        .await
        .unwrap();

    users.grant_role(user.id, admin.id).await.unwrap();
    users.grant_role(user.id, admin.id).await.unwrap();

    let granted = roles.get_user_roles(user.id).await.unwrap();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].name, "admin");
}

#[tokio::test]
async fn grant_unknown_role_is_not_found() {
    let users = SurrealUserRepository::new(setup().await);
    let user = users.create(alice()).await.unwrap();

    let err = users
        .grant_role(user.id, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, PortcullisError::NotFound { .. }), "{err:?}");
}
