//! SurrealDB repository implementations.

mod group;
mod membership;
mod password_reset;
mod permission;
mod role;
mod user;

pub use group::SurrealGroupRepository;
pub use password_reset::{RESET_DELIVERY_TARGET, SurrealPasswordResetRepository};
pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use user::SurrealUserRepository;
