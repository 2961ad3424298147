//! Request handlers, one module per resource.

pub mod auth;
pub mod groups;
pub mod health;
pub mod password_resets;
pub mod permissions;
pub mod roles;
pub mod users;
