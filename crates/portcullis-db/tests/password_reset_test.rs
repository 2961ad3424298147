//! Integration tests for the PasswordReset repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use portcullis_core::error::PortcullisError;
use portcullis_core::models::password_reset::CreatePasswordReset;
use portcullis_core::models::user::{CreateUser, User};
use portcullis_core::repository::{PasswordResetRepository, UserRepository};
use portcullis_db::repository::{SurrealPasswordResetRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> (SurrealPasswordResetRepository<Db>, User) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    portcullis_db::run_migrations(&db).await.unwrap();

    let user = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            email: "alice@example.com".into(),
            password: "old password".into(),
            full_name: None,
        })
        .await
        .unwrap();

    (SurrealPasswordResetRepository::new(db), user)
}

fn valid_for(user: &User, lifetime: Duration) -> CreatePasswordReset {
    CreatePasswordReset {
        user_id: user.id,
        expires_at: Utc::now() + lifetime,
    }
}

#[tokio::test]
async fn create_and_fetch_reset() {
    let (resets, user) = setup().await;

    let reset = resets
        .create(valid_for(&user, Duration::hours(1)))
        .await
        .unwrap();
    assert_eq!(reset.user_id, user.id);
    assert!(!reset.used);

    let fetched = resets.get_by_id(reset.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, user.id);
    assert!(fetched.is_redeemable(Utc::now()));

    assert!(resets.get_by_id(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn redeem_changes_password_and_consumes_reset() {
    let (resets, user) = setup().await;
    let reset = resets
        .create(valid_for(&user, Duration::hours(1)))
        .await
        .unwrap();

    let updated = resets.redeem(reset.id, "new password".into()).await.unwrap();
    assert_eq!(updated.id, user.id);
    assert_ne!(updated.password_hash, user.password_hash);

    let consumed = resets.get_by_id(reset.id).await.unwrap().unwrap();
    assert!(consumed.used);
}

#[tokio::test]
async fn used_reset_is_rejected() {
    let (resets, user) = setup().await;
    let reset = resets
        .create(valid_for(&user, Duration::hours(1)))
        .await
        .unwrap();
    resets.redeem(reset.id, "first".into()).await.unwrap();

    let err = resets.redeem(reset.id, "second".into()).await.unwrap_err();
    assert!(matches!(err, PortcullisError::BadRequest { .. }), "{err:?}");
}

#[tokio::test]
async fn expired_reset_is_rejected_and_password_kept() {
    let (resets, user) = setup().await;
    let reset = resets
        .create(valid_for(&user, Duration::minutes(-5)))
        .await
        .unwrap();

    let err = resets.redeem(reset.id, "new password".into()).await.unwrap_err();
    assert!(matches!(err, PortcullisError::BadRequest { .. }), "{err:?}");

    let untouched = resets.get_by_id(reset.id).await.unwrap().unwrap();
    assert!(!untouched.used);
}

#[tokio::test]
async fn unknown_reset_is_not_found() {
    let (resets, _) = setup().await;

    let err = resets
        .redeem(uuid::Uuid::new_v4(), "new password".into())
        .await
        .unwrap_err();
    assert!(matches!(err, PortcullisError::NotFound { .. }), "{err:?}");
}
