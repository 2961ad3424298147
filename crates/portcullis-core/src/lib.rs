//! Portcullis Core: domain models, the error taxonomy shared by every
//! crate, and the repository traits the database layer implements.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{PortcullisError, PortcullisResult};
