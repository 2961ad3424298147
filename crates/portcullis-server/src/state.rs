//! Application state shared by request handlers.

use std::sync::Arc;

use portcullis_auth::{AuthConfig, AuthService};
use portcullis_db::repository::{
    SurrealGroupRepository, SurrealPasswordResetRepository, SurrealPermissionRepository,
    SurrealRoleRepository, SurrealUserRepository,
};
use surrealdb::{Connection, Surreal};

pub type SurrealAuthService<C> =
    AuthService<SurrealUserRepository<C>, SurrealPasswordResetRepository<C>>;

/// Repositories and services available to every handler.
///
/// Each repository holds its own clone of the database handle; cloning
/// the state only bumps reference counts.
pub struct AppState<C: Connection> {
    pub permissions: Arc<SurrealPermissionRepository<C>>,
    pub roles: Arc<SurrealRoleRepository<C>>,
    pub groups: Arc<SurrealGroupRepository<C>>,
    pub users: Arc<SurrealUserRepository<C>>,
    pub auth: Arc<SurrealAuthService<C>>,
}

// Manual Clone implementation that doesn't require C: Clone
impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            permissions: Arc::clone(&self.permissions),
            roles: Arc::clone(&self.roles),
            groups: Arc::clone(&self.groups),
            users: Arc::clone(&self.users),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<C: Connection> AppState<C> {
    pub fn new(db: Surreal<C>, auth_config: AuthConfig) -> Self {
        let pepper = auth_config.pepper.clone();
        let users = || match &pepper {
            Some(p) => SurrealUserRepository::with_pepper(db.clone(), p.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };
        let resets = match &pepper {
            Some(p) => SurrealPasswordResetRepository::with_pepper(db.clone(), p.clone()),
            None => SurrealPasswordResetRepository::new(db.clone()),
        };

        Self {
            permissions: Arc::new(SurrealPermissionRepository::new(db.clone())),
            roles: Arc::new(SurrealRoleRepository::new(db.clone())),
            groups: Arc::new(SurrealGroupRepository::new(db.clone())),
            users: Arc::new(users()),
            auth: Arc::new(AuthService::new(users(), resets, auth_config)),
        }
    }
}
