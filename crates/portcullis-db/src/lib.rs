//! Portcullis Database: SurrealDB connection management, versioned
//! migrations and repository implementations.
//!
//! This crate provides:
//! - Opening a migrated database ([`Database`], [`DbConfig`])
//! - Reversible schema migrations ([`run_migrations`], [`rollback_to`])
//! - Repository implementations of the `portcullis-core` traits
//! - Error types ([`DbError`])

mod connection;
mod error;
mod password;
pub mod repository;
mod schema;

pub use connection::{Database, DbConfig};
pub use error::DbError;
pub use schema::{current_version, latest_version, rollback_to, run_migrations};
