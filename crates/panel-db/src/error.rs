//! Database-layer errors and their mapping into [`PanelError`].

use panel_core::error::PanelError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists")]
    Duplicate { entity: String },
}

impl From<DbError> for PanelError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PanelError::NotFound { entity, id },
            DbError::Duplicate { entity } => PanelError::AlreadyExists { entity },
            other => PanelError::Database(other.to_string()),
        }
    }
}

/// Map a failed statement, recognising unique-index violations.
pub(crate) fn statement_error(entity: &str, err: surrealdb::Error) -> DbError {
    let message = err.to_string();
    if message.contains("already contains") || message.contains("already exists") {
        DbError::Duplicate {
            entity: entity.to_string(),
        }
    } else {
        DbError::Query(message)
    }
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(value).map_err(|e| DbError::Corrupt(format!("invalid {field} UUID: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_its_kind() {
        let err: PanelError = DbError::NotFound {
            entity: "user".into(),
            id: "x".into(),
        }
        .into();
        assert!(matches!(err, PanelError::NotFound { .. }));
    }

    #[test]
    fn other_errors_become_database_errors() {
        let err: PanelError = DbError::Migration("boom".into()).into();
        assert!(matches!(err, PanelError::Database(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn bad_uuid_is_corrupt() {
        assert!(matches!(
            parse_uuid("user", "nope"),
            Err(DbError::Corrupt(_))
        ));
    }
}
