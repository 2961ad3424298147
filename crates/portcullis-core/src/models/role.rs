//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named bundle of permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Allow-listed partial update for a role.
///
/// `permissions` lists permission names to add to the role. Existing
/// grants are never removed by an update.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

impl UpdateRole {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.permissions.is_none()
    }
}

/// Result of a role update: the stored role plus any permission names
/// that did not resolve and were skipped.
#[derive(Debug, Clone)]
pub struct RoleUpdateOutcome {
    pub role: Role,
    pub unresolved_permissions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_only_update_is_not_empty() {
        let update: UpdateRole = serde_json::from_str(r#"{"permissions": []}"#).unwrap();
        assert!(!update.is_empty());
    }

    #[test]
    fn empty_object_is_empty() {
        let update: UpdateRole = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());
    }
}
