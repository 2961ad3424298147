//! Domain models for Portcullis.
//!
//! These are the core types shared across all crates.

pub mod group;
pub mod password_reset;
pub mod permission;
pub mod role;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserialize a present JSON value (including `null`) as `Some`.
///
/// Paired with `#[serde(default)]` this distinguishes an absent key
/// (`None`) from an explicit `null` (`Some(None)`) on
/// `Option<Option<T>>` fields.
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
