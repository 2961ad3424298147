//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookup accessors return
//! `Ok(None)` for a missing record; deciding whether absence is an
//! error is left to the caller.

use uuid::Uuid;

use crate::error::PortcullisResult;
use crate::models::{
    group::{CreateGroup, Group, GroupUpdateOutcome, UpdateGroup},
    password_reset::{CreatePasswordReset, PasswordReset},
    permission::{CreatePermission, Permission, UpdatePermission},
    role::{CreateRole, Role, RoleUpdateOutcome, UpdateRole},
    user::{CreateUser, User},
};

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

pub trait PermissionRepository: Send + Sync {
    /// Fails with `Conflict` when the name is taken.
    fn create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = PortcullisResult<Permission>> + Send;
    fn list(&self) -> impl Future<Output = PortcullisResult<Vec<Permission>>> + Send;
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = PortcullisResult<Option<Permission>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePermission,
    ) -> impl Future<Output = PortcullisResult<Permission>> + Send;
    /// Removes the permission and every grant referencing it.
    fn delete(&self, id: Uuid) -> impl Future<Output = PortcullisResult<()>> + Send;

    /// Get all permissions granted to a role.
    fn get_role_permissions(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = PortcullisResult<Vec<Permission>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = PortcullisResult<Role>> + Send;
    fn list(&self) -> impl Future<Output = PortcullisResult<Vec<Role>>> + Send;
    fn get_by_name(&self, name: &str)
    -> impl Future<Output = PortcullisResult<Option<Role>>> + Send;
    /// Adds the named permissions (skipping names that do not resolve),
    /// then applies the scalar fields, in one transaction.
    fn update(
        &self,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = PortcullisResult<RoleUpdateOutcome>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = PortcullisResult<()>> + Send;

    /// Get all roles held by a group.
    fn get_group_roles(
        &self,
        group_id: Uuid,
    ) -> impl Future<Output = PortcullisResult<Vec<Role>>> + Send;

    /// Get all roles granted directly to a user.
    fn get_user_roles(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = PortcullisResult<Vec<Role>>> + Send;
}

pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = PortcullisResult<Group>> + Send;
    fn list(&self) -> impl Future<Output = PortcullisResult<Vec<Group>>> + Send;
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = PortcullisResult<Option<Group>>> + Send;
    /// Adds the named roles (skipping names that do not resolve), then
    /// applies the scalar fields, in one transaction.
    fn update(
        &self,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = PortcullisResult<GroupUpdateOutcome>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = PortcullisResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Hashes the password, then stores the user. Fails with `Conflict`
    /// when the email is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = PortcullisResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PortcullisResult<Option<User>>> + Send;
    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = PortcullisResult<Option<User>>> + Send;
    /// Replace the stored hash with one derived from `password`.
    fn set_password(
        &self,
        id: Uuid,
        password: String,
    ) -> impl Future<Output = PortcullisResult<User>> + Send;
    /// Grant a role directly to a user. Granting twice is a no-op.
    fn grant_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = PortcullisResult<()>> + Send;
}

pub trait PasswordResetRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePasswordReset,
    ) -> impl Future<Output = PortcullisResult<PasswordReset>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = PortcullisResult<Option<PasswordReset>>> + Send;
    /// Atomically mark the reset used and store the new password for its
    /// owner. Fails if the reset was consumed or expired in the meantime.
    fn redeem(
        &self,
        id: Uuid,
        new_password: String,
    ) -> impl Future<Output = PortcullisResult<User>> + Send;
}
