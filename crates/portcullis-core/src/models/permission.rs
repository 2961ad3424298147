//! Permission domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An atomic named capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Allow-listed partial update. Keys not named here are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePermission {
    #[serde(default)]
    pub name: Option<String>,
    /// `Some(Some(v))` = set, `Some(None)` = clear, `None` = no change.
    #[serde(
        default,
        deserialize_with = "super::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

impl UpdatePermission {
    /// True when the payload names no updatable field.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
