//! Group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named bundle of roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// Role names to add to the group.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl UpdateGroup {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.roles.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct GroupUpdateOutcome {
    pub group: Group,
    pub unresolved_roles: Vec<String>,
}
