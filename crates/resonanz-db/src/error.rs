//! Database-specific error types and conversions.

use resonanz_core::error::ResonanzError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// A unique index rejected the insert because another writer got
    /// there first. Find-or-create recovers by re-reading the winner.
    #[error("Duplicate key on {entity}: {message}")]
    DuplicateRace { entity: String, message: String },

    /// Optimistic transaction conflict; the statement can be re-run.
    #[error("Write conflict on {entity}: {message}")]
    WriteConflict { entity: String, message: String },

    /// A unique index rejected the insert but no row with the same
    /// identity exists to return.
    #[error("Constraint violation on {entity}: {message}")]
    Constraint { entity: String, message: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Tenant references address {address_id} which does not exist")]
    MissingAddress { address_id: i64 },

    #[error("Invalid connection configuration: {0}")]
    Config(String),
}

impl DbError {
    /// Classify a failed statement from `Response::check`.
    pub(crate) fn from_statement(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if is_duplicate_key(&message) {
            DbError::DuplicateRace {
                entity: entity.into(),
                message,
            }
        } else if is_write_conflict(&message) {
            DbError::WriteConflict {
                entity: entity.into(),
                message,
            }
        } else {
            DbError::Query(message)
        }
    }
}

fn is_duplicate_key(message: &str) -> bool {
    message.contains("already contains")
}

fn is_write_conflict(message: &str) -> bool {
    message.contains("read or write conflict") || message.contains("can be retried")
}

impl From<DbError> for ResonanzError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ResonanzError::NotFound { entity, id },
            DbError::MissingAddress { .. } => ResonanzError::Internal(err.to_string()),
            other => ResonanzError::Storage(other.to_string()),
        }
    }
}
