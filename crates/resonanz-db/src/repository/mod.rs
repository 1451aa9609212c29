//! SurrealDB repository implementations.

mod address;
mod tenant;

pub use address::SurrealAddressRepository;
pub use tenant::SurrealTenantRepository;

use surrealdb::{Connection, Surreal};
use tracing::debug;

use crate::error::DbError;

/// How many times find-or-create re-reads after losing an insert race
/// or hitting a write conflict.
const MAX_ATTEMPTS: usize = 5;

/// Retries for a contended `_sequence` counter.
const SEQUENCE_ATTEMPTS: usize = 16;

/// Allocate the next integer id for `table`.
///
/// Ids are never reused; an insert that fails after allocation leaves
/// a gap.
async fn next_id<C: Connection>(db: &Surreal<C>, table: &str) -> Result<i64, DbError> {
    for attempt in 1..=SEQUENCE_ATTEMPTS {
        let result = db
            .query(
                "UPSERT ONLY type::record('_sequence', $table) \
                 SET value = (value ?? 0) + 1 \
                 RETURN VALUE value",
            )
            .bind(("table", table.to_string()))
            .await?;

        match result.check() {
            Ok(mut result) => {
                let value: Option<i64> = result.take(0)?;
                return value.ok_or_else(|| {
                    DbError::Query(format!("sequence for {table} returned no value"))
                });
            }
            Err(e) => match DbError::from_statement("_sequence", e) {
                DbError::WriteConflict { message, .. } => {
                    debug!(table, attempt, %message, "Sequence contention, retrying");
                }
                other => return Err(other),
            },
        }
    }

    Err(DbError::Query(format!(
        "could not allocate an id for {table} after {SEQUENCE_ATTEMPTS} attempts"
    )))
}
