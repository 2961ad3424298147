//! Database-specific error types and conversions.

use portcullis_core::error::PortcullisError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} {key}")]
    NotFound { entity: String, key: String },

    #[error("Duplicate {entity}: {name}")]
    Duplicate { entity: String, name: String },

    #[error("{0}")]
    Rejected(String),

    #[error("Concurrent membership change: {0}")]
    MembershipRace(String),
}

impl DbError {
    /// Classify a failed statement, recognising unique-index violations.
    ///
    /// SurrealDB reports those as "Database index `idx` already contains
    /// ..."; anything else is a plain query failure.
    pub(crate) fn from_statement(err: surrealdb::Error, entity: &str, name: &str) -> Self {
        let message = err.to_string();
        if is_unique_violation(&message) {
            DbError::Duplicate {
                entity: entity.to_string(),
                name: name.to_string(),
            }
        } else {
            DbError::Query(message)
        }
    }

    /// Classify the failures of a transaction that merges membership
    /// edges and then updates a named record.
    ///
    /// When one statement fails, every other statement in the
    /// transaction reports a generic "not executed" error, so all of
    /// them are inspected. Only a violation of `name_index` is a rename
    /// conflict; a violation of a membership pair index, or a commit
    /// conflict, means another writer changed the same membership and
    /// yields [`DbError::MembershipRace`].
    pub(crate) fn from_statements(
        errors: impl IntoIterator<Item = (usize, surrealdb::Error)>,
        entity: &str,
        name: &str,
        name_index: &str,
    ) -> Self {
        let mut errors: Vec<_> = errors.into_iter().collect();
        errors.sort_by_key(|(index, _)| *index);

        let messages: Vec<String> = errors.into_iter().map(|(_, e)| e.to_string()).collect();
        classify(&messages, entity, name, name_index)
    }
}

fn classify(messages: &[String], entity: &str, name: &str, name_index: &str) -> DbError {
    let quoted_index = format!("`{name_index}`");
    if messages
        .iter()
        .any(|m| is_unique_violation(m) && m.contains(&quoted_index))
    {
        return DbError::Duplicate {
            entity: entity.to_string(),
            name: name.to_string(),
        };
    }

    if let Some(message) = messages
        .iter()
        .find(|m| is_unique_violation(m) || is_retryable_conflict(m))
    {
        return DbError::MembershipRace(message.clone());
    }

    DbError::Query(messages.join("; "))
}

fn is_retryable_conflict(message: &str) -> bool {
    message.contains("can be retried")
}

fn is_unique_violation(message: &str) -> bool {
    message.contains("already contains")
}

impl From<DbError> for PortcullisError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, key } => PortcullisError::NotFound { entity, key },
            DbError::Duplicate { entity, name } => PortcullisError::Conflict { entity, name },
            DbError::Hash(msg) => PortcullisError::Crypto(msg),
            DbError::Rejected(message) => PortcullisError::BadRequest { message },
            other => PortcullisError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_recognised() {
        assert!(is_unique_violation(
            "Database index `idx_permissions_name` already contains 'p1', \
             with record `permissions:abc`"
        ));
        assert!(!is_unique_violation("Parse error: unexpected token"));
    }

    #[test]
    fn duplicate_maps_to_conflict() {
        let err: PortcullisError = DbError::Duplicate {
            entity: "Permission".into(),
            name: "p1".into(),
        }
        .into();
        assert!(matches!(err, PortcullisError::Conflict { .. }));
    }

    fn messages(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn name_index_violation_is_a_rename_conflict() {
        let err = classify(
            &messages(&[
                "The query was not executed due to a failed transaction",
                "Database index `idx_roles_name` already contains 'admin', \
                 with record `roles:abc`",
            ]),
            "Role",
            "admin",
            "idx_roles_name",
        );
        match err {
            DbError::Duplicate { entity, name } => {
                assert_eq!(entity, "Role");
                assert_eq!(name, "admin");
            }
            other => panic!("expected Duplicate, got {other:?}"),
        }
    }

    #[test]
    fn pair_index_violation_is_a_membership_race() {
        let err = classify(
            &messages(&[
                "Database index `idx_permission_role_pair` already contains \
                 [roles:abc, permissions:def], with record `permission_role:xyz`",
                "The query was not executed due to a failed transaction",
            ]),
            "Role",
            "",
            "idx_roles_name",
        );
        assert!(matches!(err, DbError::MembershipRace(_)), "{err:?}");
    }

    #[test]
    fn commit_conflict_is_a_membership_race() {
        let err = classify(
            &messages(&[
                "Failed to commit transaction due to a read or write conflict. \
                 This transaction can be retried",
            ]),
            "Group",
            "",
            "idx_groups_name",
        );
        assert!(matches!(err, DbError::MembershipRace(_)), "{err:?}");
    }

    #[test]
    fn other_failures_stay_query_errors() {
        let err = classify(
            &messages(&["Parse error: unexpected token"]),
            "Role",
            "",
            "idx_roles_name",
        );
        assert!(matches!(err, DbError::Query(_)), "{err:?}");
    }
}
